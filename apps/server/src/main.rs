use std::process::ExitCode;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use chrono::Utc;
use clap::{Parser, Subcommand};

use tapptrak::config::Config;
use tapptrak::db::{self, DbPool};
use tapptrak::error::{AppError, AppResult};
use tapptrak::logging;
use tapptrak::monitor::{SweepMonitor, Sweeper};
use tapptrak::routes;
use tapptrak::services::{NotificationService, SettingsService, SmtpMailer};

/// TappTrak visitor overstay monitor
#[derive(Parser)]
#[command(name = "tapptrak")]
#[command(version)]
#[command(about = "Visitor overstay sweep, notifications and API for TappTrak")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one overstay sweep and exit (for cron)
    Sweep,

    /// Serve the HTTP API and sweep on a fixed interval
    Serve,

    /// Read or change system settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Send a single visitor notification
    Notify {
        #[command(subcommand)]
        kind: NotifyCommand,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// List all settings
    List,
    /// Print one setting
    Get { key: String },
    /// Create or update a setting
    Set {
        key: String,
        value: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum NotifyCommand {
    /// Check-in notice to the flat owner
    Checkin { visit_id: i64 },
    /// Check-out notice to the flat owner
    Checkout { visit_id: i64 },
    /// Overstay alert to admin and security staff
    Overstay { visit_id: i64 },
}

#[actix_web::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env();
    let log_file = config
        .as_ref()
        .ok()
        .and_then(|c| c.monitor.log_file.clone());
    if let Err(e) = logging::init(log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: Config) -> std::io::Result<ExitCode> {
    let pool = connect(&config).await?;

    match command {
        Commands::Sweep => {
            let sweeper = Sweeper::new(pool, notification_service(&config), config.monitor);
            let report = sweeper.run(Utc::now()).await;
            Ok(if report.is_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Serve => serve(pool, config).await.map(|_| ExitCode::SUCCESS),
        Commands::Settings { action } => settings_command(&pool, action)
            .await
            .map_err(std::io::Error::other),
        Commands::Notify { kind } => {
            let notifications = notification_service(&config);
            notify_command(&pool, &notifications, kind)
                .await
                .map(|_| ExitCode::SUCCESS)
                .map_err(std::io::Error::other)
        }
    }
}

async fn connect(config: &Config) -> std::io::Result<DbPool> {
    let pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    db::run_migrations(&pool).await.map_err(|e| {
        log::error!("Migration error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    Ok(pool)
}

fn notification_service(config: &Config) -> NotificationService {
    let mailer = SmtpMailer::new(config.smtp.clone());
    if !mailer.is_configured() {
        log::warn!("SMTP_HOST not set, mail attempts will be recorded as failed");
    }
    NotificationService::new(Arc::new(mailer), config.site.name.clone())
}

async fn serve(pool: DbPool, config: Config) -> std::io::Result<()> {
    log::info!("Starting TappTrak server on {}:{}", config.host, config.port);

    let notifications = notification_service(&config);
    let monitor = SweepMonitor::new(Sweeper::new(
        pool.clone(),
        notifications.clone(),
        config.monitor.clone(),
    ));
    let sweep_task = monitor.spawn(config.monitor.interval);

    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(notifications.clone()))
            .app_data(web::Data::new(monitor.clone()))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    let result = server.await;
    sweep_task.abort();
    result
}

async fn settings_command(pool: &DbPool, action: SettingsCommand) -> AppResult<ExitCode> {
    match action {
        SettingsCommand::List => {
            for setting in SettingsService::list(pool).await? {
                println!("{} = {}", setting.setting_key, setting.setting_value);
            }
            Ok(ExitCode::SUCCESS)
        }
        SettingsCommand::Get { key } => match SettingsService::get(pool, &key).await? {
            Some(value) => {
                println!("{}", value);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                log::warn!("Setting '{}' is not set", key);
                Ok(ExitCode::FAILURE)
            }
        },
        SettingsCommand::Set {
            key,
            value,
            description,
        } => {
            let setting =
                SettingsService::set(pool, &key, &value, description.as_deref()).await?;
            log::info!("Setting '{}' = '{}'", setting.setting_key, setting.setting_value);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn notify_command(
    pool: &DbPool,
    notifications: &NotificationService,
    kind: NotifyCommand,
) -> AppResult<()> {
    let now = Utc::now();
    let (visit_id, delivered) = match kind {
        NotifyCommand::Checkin { visit_id } => (
            visit_id,
            notifications
                .send_checkin_notification(pool, visit_id, now)
                .await?,
        ),
        NotifyCommand::Checkout { visit_id } => (
            visit_id,
            notifications
                .send_checkout_notification(pool, visit_id, now)
                .await?,
        ),
        NotifyCommand::Overstay { visit_id } => (
            visit_id,
            notifications.send_overstay_alert(pool, visit_id, now).await?,
        ),
    };

    if delivered {
        log::info!("Notification for visit {} handled", visit_id);
        Ok(())
    } else {
        Err(AppError::Mail(format!(
            "Notification for visit {} was not delivered",
            visit_id
        )))
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
