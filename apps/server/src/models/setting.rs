use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

pub const MAX_VISIT_DURATION: &str = "max_visit_duration";
pub const OVERSTAY_WARNING_TIME: &str = "overstay_warning_time";
pub const ENABLE_NOTIFICATIONS: &str = "enable_notifications";
pub const EMAIL_NOTIFICATIONS: &str = "email_notifications";

const DEFAULT_MAX_VISIT_DURATION: i32 = 240;
const DEFAULT_OVERSTAY_WARNING_TIME: i32 = 180;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Setting {
    pub setting_key: String,
    pub setting_value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for upserting a setting
#[derive(Debug, Deserialize)]
pub struct UpdateSetting {
    pub value: String,
    pub description: Option<String>,
}

/// Snapshot of the tunables the monitor reads once per sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorSettings {
    /// Minutes; default expected duration for new check-ins
    pub max_visit_duration: i32,
    /// Minutes. Loaded for reporting only: the approaching-overstay window is fixed.
    pub overstay_warning_time: i32,
    pub enable_notifications: bool,
    pub email_notifications: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_visit_duration: DEFAULT_MAX_VISIT_DURATION,
            overstay_warning_time: DEFAULT_OVERSTAY_WARNING_TIME,
            enable_notifications: true,
            email_notifications: true,
        }
    }
}

impl MonitorSettings {
    /// Builds a snapshot from raw key/value pairs, applying defaults to
    /// missing or unparseable entries
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        Self {
            max_visit_duration: parse_minutes(values.get(MAX_VISIT_DURATION))
                .unwrap_or(defaults.max_visit_duration),
            overstay_warning_time: parse_minutes(values.get(OVERSTAY_WARNING_TIME))
                .unwrap_or(defaults.overstay_warning_time),
            enable_notifications: parse_flag(values.get(ENABLE_NOTIFICATIONS))
                .unwrap_or(defaults.enable_notifications),
            email_notifications: parse_flag(values.get(EMAIL_NOTIFICATIONS))
                .unwrap_or(defaults.email_notifications),
        }
    }

    /// Whether the sweep should hand overstays to the mail dispatcher
    pub fn should_email(&self) -> bool {
        self.enable_notifications && self.email_notifications
    }
}

fn parse_minutes(raw: Option<&String>) -> Option<i32> {
    raw.and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|minutes| *minutes > 0)
}

fn parse_flag(raw: Option<&String>) -> Option<bool> {
    raw.map(|v| matches!(v.trim(), "1" | "true"))
}
