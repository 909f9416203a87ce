pub mod extractors;

pub use extractors::{resolve_role, Principal};
