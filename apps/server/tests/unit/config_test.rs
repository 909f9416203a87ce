//! Unit tests for configuration parsing
//!
//! Tests environment variable parsing and default values.
//!
//! Note: These tests modify global environment variables and must run serially.

use std::time::Duration;

use tapptrak::config::{
    ConfigError, DatabaseConfig, MonitorConfig, SecurityConfig, SiteConfig, SmtpConfig,
    MAX_RENOTIFY_MINUTES,
};
use serial_test::serial;

fn clear_monitor_env() {
    std::env::remove_var("SWEEP_INTERVAL_SECS");
    std::env::remove_var("SWEEP_TIME_BUDGET_SECS");
    std::env::remove_var("OVERSTAY_RENOTIFY_MINUTES");
    std::env::remove_var("MONITOR_LOG_FILE");
}

// =============================================================================
// Monitor Config Tests
// =============================================================================

#[test]
#[serial]
fn test_monitor_config_defaults() {
    clear_monitor_env();

    let config = MonitorConfig::from_env().unwrap();

    assert_eq!(config.interval, Duration::from_secs(300));
    assert_eq!(config.time_budget, Duration::from_secs(300));
    assert!(config.renotify_window.is_none());
    assert!(config.log_file.is_none());
}

#[test]
#[serial]
fn test_monitor_config_custom_values() {
    clear_monitor_env();
    std::env::set_var("SWEEP_INTERVAL_SECS", "60");
    std::env::set_var("SWEEP_TIME_BUDGET_SECS", "45");
    std::env::set_var("OVERSTAY_RENOTIFY_MINUTES", "30");
    std::env::set_var("MONITOR_LOG_FILE", "/var/log/tapptrak/overstay.log");

    let config = MonitorConfig::from_env().unwrap();

    assert_eq!(config.interval, Duration::from_secs(60));
    assert_eq!(config.time_budget, Duration::from_secs(45));
    assert_eq!(config.renotify_window, Some(chrono::Duration::minutes(30)));
    assert_eq!(
        config.log_file.as_deref(),
        Some(std::path::Path::new("/var/log/tapptrak/overstay.log"))
    );

    clear_monitor_env();
}

#[test]
#[serial]
fn test_zero_interval_is_rejected() {
    clear_monitor_env();
    std::env::set_var("SWEEP_INTERVAL_SECS", "0");

    let result = MonitorConfig::from_env();
    assert!(matches!(result, Err(ConfigError::InvalidInterval)));

    clear_monitor_env();
}

#[test]
#[serial]
fn test_invalid_renotify_window_is_rejected() {
    for value in ["soon", "0", "-10"] {
        clear_monitor_env();
        std::env::set_var("OVERSTAY_RENOTIFY_MINUTES", value);

        let result = MonitorConfig::from_env();
        assert!(
            matches!(result, Err(ConfigError::InvalidRenotifyWindow)),
            "value {value:?} should be rejected"
        );
    }
    clear_monitor_env();
}

#[test]
#[serial]
fn test_oversized_renotify_window_is_rejected() {
    for value in ["100000000000000", "9999999999999999", "525601"] {
        clear_monitor_env();
        std::env::set_var("OVERSTAY_RENOTIFY_MINUTES", value);

        let result = MonitorConfig::from_env();
        assert!(
            matches!(result, Err(ConfigError::InvalidRenotifyWindow)),
            "value {value:?} should be rejected"
        );
    }
    clear_monitor_env();
}

#[test]
#[serial]
fn test_one_year_renotify_window_is_accepted() {
    clear_monitor_env();
    std::env::set_var("OVERSTAY_RENOTIFY_MINUTES", MAX_RENOTIFY_MINUTES.to_string());

    let config = MonitorConfig::from_env().unwrap();
    assert_eq!(
        config.renotify_window,
        Some(chrono::Duration::days(365))
    );

    clear_monitor_env();
}

#[test]
#[serial]
fn test_blank_renotify_window_means_disabled() {
    clear_monitor_env();
    std::env::set_var("OVERSTAY_RENOTIFY_MINUTES", "  ");

    let config = MonitorConfig::from_env().unwrap();
    assert!(config.renotify_window.is_none());

    clear_monitor_env();
}

// =============================================================================
// Security Config Tests
// =============================================================================

#[test]
#[serial]
fn test_security_tokens_must_differ() {
    std::env::set_var("ADMIN_API_TOKEN", "same");
    std::env::set_var("SECURITY_API_TOKEN", "same");

    let result = SecurityConfig::from_env();
    assert!(matches!(result, Err(ConfigError::DuplicateApiToken)));

    std::env::remove_var("ADMIN_API_TOKEN");
    std::env::remove_var("SECURITY_API_TOKEN");
}

#[test]
#[serial]
fn test_empty_token_disables_role() {
    std::env::set_var("ADMIN_API_TOKEN", "");
    std::env::set_var("SECURITY_API_TOKEN", "guard");

    let config = SecurityConfig::from_env().unwrap();
    assert!(config.admin_token.is_none());
    assert_eq!(config.security_token.as_deref(), Some("guard"));

    std::env::remove_var("ADMIN_API_TOKEN");
    std::env::remove_var("SECURITY_API_TOKEN");
}

// =============================================================================
// Site / SMTP Config Tests
// =============================================================================

#[test]
#[serial]
fn test_smtp_sender_defaults_to_site_host() {
    std::env::remove_var("SMTP_FROM");
    std::env::remove_var("SMTP_HOST");
    std::env::remove_var("SMTP_PORT");
    std::env::set_var("SITE_NAME", "Green Acres");
    std::env::set_var("SITE_URL", "https://gate.greenacres.in/app");

    let site = SiteConfig::from_env();
    let smtp = SmtpConfig::from_env(&site);

    assert_eq!(smtp.from_address, "Green Acres <noreply@gate.greenacres.in>");
    assert_eq!(smtp.port, 587);
    assert!(smtp.host.is_none());

    std::env::remove_var("SITE_NAME");
    std::env::remove_var("SITE_URL");
}

#[test]
#[serial]
fn test_single_connection_pool_is_rejected() {
    std::env::set_var("DATABASE_URL", "postgres://localhost/tapptrak");
    std::env::set_var("DATABASE_MAX_CONNECTIONS", "1");

    let result = DatabaseConfig::from_env();
    assert!(matches!(result, Err(ConfigError::PoolTooSmall)));

    std::env::set_var("DATABASE_MAX_CONNECTIONS", "2");
    let config = DatabaseConfig::from_env().unwrap();
    assert_eq!(config.max_connections, 2);

    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("DATABASE_MAX_CONNECTIONS");
}

#[test]
#[serial]
fn test_missing_database_url() {
    std::env::remove_var("DATABASE_URL");

    let result = DatabaseConfig::from_env();
    assert!(matches!(result, Err(ConfigError::MissingDatabaseUrl)));
}
