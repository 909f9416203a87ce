use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for `OVERSTAY_RENOTIFY_MINUTES` (one year)
pub const MAX_RENOTIFY_MINUTES: i64 = 365 * 24 * 60;

/// The sweep holds one connection for its advisory lock and needs at least
/// one more for its queries
pub const MIN_POOL_CONNECTIONS: u32 = 2;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub site: SiteConfig,
    pub smtp: SmtpConfig,
    pub monitor: MonitorConfig,
    pub security: SecurityConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Branding used in outgoing mail
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
}

/// SMTP transport settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

/// Overstay sweep scheduling
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between sweeps in `serve` mode
    pub interval: Duration,
    /// Hard budget for a single sweep
    pub time_budget: Duration,
    /// When set, an overstayed visit is re-notified at most once per window
    pub renotify_window: Option<chrono::Duration>,
    /// Append-only log file for sweep output
    pub log_file: Option<PathBuf>,
}

/// Bearer tokens for the HTTP API. A missing token disables that role.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub admin_token: Option<String>,
    pub security_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let site = SiteConfig::from_env();
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            smtp: SmtpConfig::from_env(&site),
            site,
            monitor: MonitorConfig::from_env()?,
            security: SecurityConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let max_connections: u32 = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        if max_connections < MIN_POOL_CONNECTIONS {
            return Err(ConfigError::PoolTooSmall);
        }

        Ok(Self {
            url,
            max_connections,
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl SiteConfig {
    pub fn from_env() -> Self {
        Self {
            name: env::var("SITE_NAME").unwrap_or_else(|_| "TappTrak".to_string()),
            url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
        }
    }

    /// Host part of the site URL, used for the default sender address
    pub fn host(&self) -> &str {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(self.url.as_str());
        without_scheme
            .split(['/', ':'])
            .next()
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost")
    }
}

impl SmtpConfig {
    /// Load SMTP settings; the sender defaults to `noreply@<site host>`
    pub fn from_env(site: &SiteConfig) -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from_address: env::var("SMTP_FROM")
                .unwrap_or_else(|_| format!("{} <noreply@{}>", site.name, site.host())),
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let interval_secs: u64 = env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let renotify_window = match env::var("OVERSTAY_RENOTIFY_MINUTES") {
            Ok(v) if !v.trim().is_empty() => {
                let minutes: i64 = v
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidRenotifyWindow)?;
                if !(1..=MAX_RENOTIFY_MINUTES).contains(&minutes) {
                    return Err(ConfigError::InvalidRenotifyWindow);
                }
                Some(
                    chrono::Duration::try_minutes(minutes)
                        .ok_or(ConfigError::InvalidRenotifyWindow)?,
                )
            }
            _ => None,
        };

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            time_budget: Duration::from_secs(
                env::var("SWEEP_TIME_BUDGET_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            ),
            renotify_window,
            log_file: env::var("MONITOR_LOG_FILE")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            time_budget: Duration::from_secs(300),
            renotify_window: None,
            log_file: None,
        }
    }
}

impl SecurityConfig {
    /// Load API tokens from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin_token = env::var("ADMIN_API_TOKEN").ok().filter(|t| !t.is_empty());
        let security_token = env::var("SECURITY_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        if let (Some(a), Some(s)) = (&admin_token, &security_token) {
            if a == s {
                return Err(ConfigError::DuplicateApiToken);
            }
        }

        Ok(Self {
            admin_token,
            security_token,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
    InvalidInterval,
    InvalidRenotifyWindow,
    DuplicateApiToken,
    PoolTooSmall,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::InvalidInterval => {
                write!(f, "SWEEP_INTERVAL_SECS must be a positive number")
            }
            ConfigError::InvalidRenotifyWindow => {
                write!(
                    f,
                    "OVERSTAY_RENOTIFY_MINUTES must be between 1 and {}",
                    MAX_RENOTIFY_MINUTES
                )
            }
            ConfigError::DuplicateApiToken => {
                write!(f, "ADMIN_API_TOKEN and SECURITY_API_TOKEN must differ")
            }
            ConfigError::PoolTooSmall => write!(
                f,
                "DATABASE_MAX_CONNECTIONS must be at least {}",
                MIN_POOL_CONNECTIONS
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
