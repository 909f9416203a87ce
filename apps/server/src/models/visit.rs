//! Visit models: one row of `visitor_logs` per check-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Inside,
    Overstayed,
    Exited,
    ForcedExit,
}

impl VisitStatus {
    /// Open visits have no check-out time yet
    pub fn is_open(self) -> bool {
        matches!(self, VisitStatus::Inside | VisitStatus::Overstayed)
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisitStatus::Inside => write!(f, "inside"),
            VisitStatus::Overstayed => write!(f, "overstayed"),
            VisitStatus::Exited => write!(f, "exited"),
            VisitStatus::ForcedExit => write!(f, "forced_exit"),
        }
    }
}

/// A visit row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Visit {
    pub id: i64,
    pub visitor_id: i32,
    pub flat_id: i32,
    pub guard_id: i32,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    /// Minutes
    pub expected_duration: i32,
    pub purpose: Option<String>,
    pub vehicle_number: Option<String>,
    pub items_carried: Option<String>,
    pub notes: Option<String>,
    pub status: VisitStatus,
}

/// A visit joined with its visitor, flat and guard, as needed for messaging
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VisitDetails {
    pub id: i64,
    pub visitor_id: i32,
    pub flat_id: i32,
    pub guard_id: i32,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub expected_duration: i32,
    pub purpose: Option<String>,
    pub status: VisitStatus,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub flat_number: String,
    pub owner_name: String,
    pub owner_email: Option<String>,
    pub guard_name: String,
    pub guard_phone: String,
}

/// An open visit as seen by the sweep, with elapsed minutes computed at the
/// sweep's reference time
#[derive(Debug, Clone, FromRow)]
pub struct OpenVisit {
    pub id: i64,
    pub flat_id: i32,
    pub check_in_time: DateTime<Utc>,
    pub expected_duration: i32,
    pub status: VisitStatus,
    pub visitor_name: String,
    pub flat_number: String,
    pub elapsed_minutes: i64,
}

/// DTO for checking a visitor in
#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub visitor_id: i32,
    pub flat_id: i32,
    pub guard_id: i32,
    pub purpose: Option<String>,
    /// Minutes; defaults to the `max_visit_duration` setting
    pub expected_duration: Option<i32>,
    pub vehicle_number: Option<String>,
    pub items_carried: Option<String>,
}

/// DTO for checking a visitor out
#[derive(Debug, Default, Deserialize)]
pub struct CheckOutRequest {
    pub notes: Option<String>,
    /// Guard-initiated removal rather than a normal exit
    #[serde(default)]
    pub forced: bool,
}
