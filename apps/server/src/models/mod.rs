pub mod alert;
pub mod audit;
pub mod setting;
pub mod user;
pub mod visit;

pub use alert::{Alert, AlertFilter, AlertKind, AlertStatus, NewAlert, Severity};
pub use audit::{AuditEntry, NewAuditEntry};
pub use setting::{MonitorSettings, Setting, UpdateSetting};
pub use user::{Role, User};
pub use visit::{CheckInRequest, CheckOutRequest, OpenVisit, Visit, VisitDetails, VisitStatus};
