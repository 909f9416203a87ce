//! Overstay monitor: the periodic sweep that flags visitors who stayed past
//! their expected duration.

pub mod classify;
pub mod scheduler;
pub mod sweep;

pub use classify::{classify, VisitClass, APPROACHING_WINDOW_MINUTES};
pub use scheduler::SweepMonitor;
pub use sweep::{SweepOutcome, SweepReport, SweepSummary, Sweeper, SYSTEM_ACTOR};
