//! Alert models.
//!
//! Alerts are operator-facing records raised by the overstay sweep or by
//! hand. The storage layer guarantees at most one `active` alert per
//! (visit, kind).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =============================================================================
// Alert Kind Enum
// =============================================================================

/// What condition raised the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overstay,
    ApproachingOverstay,
    Manual,
}

impl AlertKind {
    /// Default title shown to operators
    pub fn title(self) -> &'static str {
        match self {
            AlertKind::Overstay => "Visitor Overstayed",
            AlertKind::ApproachingOverstay => "Visitor Approaching Overstay",
            AlertKind::Manual => "Security Alert",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Overstay => write!(f, "overstay"),
            AlertKind::ApproachingOverstay => write!(f, "approaching_overstay"),
            AlertKind::Manual => write!(f, "manual"),
        }
    }
}

// =============================================================================
// Severity Enum
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

// =============================================================================
// Alert Status Enum
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    /// Resolved and dismissed alerts are final and eligible for retention cleanup
    pub fn is_terminal(self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::Dismissed)
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Acknowledged => write!(f, "acknowledged"),
            AlertStatus::Resolved => write!(f, "resolved"),
            AlertStatus::Dismissed => write!(f, "dismissed"),
        }
    }
}

// =============================================================================
// Alert Model
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Alert {
    pub id: i64,
    pub alert_kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub status: AlertStatus,
    pub related_visit_id: Option<i64>,
    pub related_flat_id: Option<i32>,
    pub related_guard_id: Option<i32>,
    pub created_by: String,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating an alert
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub visit_id: Option<i64>,
    pub flat_id: Option<i32>,
    pub guard_id: Option<i32>,
    pub created_by: String,
}

/// Query filters for listing alerts
#[derive(Debug, Default, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub severity: Option<Severity>,
}
