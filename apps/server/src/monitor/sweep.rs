//! One overstay sweep: reclassify, alert, notify, clean up.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::classify::{classify, VisitClass, APPROACHING_WINDOW_MINUTES};
use crate::config::MonitorConfig;
use crate::db::SweepLock;
use crate::error::{AppError, AppResult};
use crate::models::{AlertKind, MonitorSettings, NewAlert, NewAuditEntry, OpenVisit, Severity, VisitStatus};
use crate::services::{AlertService, AuditService, NotificationService, SettingsService, VisitService};

/// Creator recorded on alerts and audit entries written by the sweep
pub const SYSTEM_ACTOR: &str = "system";

/// Audit action marking a delivered overstay notification; drives the
/// optional re-notification window
pub const OVERSTAY_NOTIFIED_ACTION: &str = "overstay_alert_sent";
const VISIT_TABLE: &str = "visitor_logs";

/// Counters for one completed sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub overstays_processed: u64,
    pub warnings_found: u64,
    pub overstay_alerts_created: u64,
    pub warning_alerts_created: u64,
    pub notifications_sent: u64,
    pub failures: u64,
    pub alerts_cleaned: u64,
    pub audit_logs_cleaned: u64,
}

impl SweepSummary {
    pub fn alerts_created(&self) -> u64 {
        self.overstay_alerts_created + self.warning_alerts_created
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    Completed { summary: SweepSummary },
    /// Another sweep held the lock
    Skipped,
    Failed { error: String },
    TimedOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    /// Reference time the sweep evaluated visits against
    pub reference_time: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

impl SweepReport {
    /// Whether the process running this sweep should exit non-zero
    pub fn is_failure(&self) -> bool {
        matches!(
            self.outcome,
            SweepOutcome::Failed { .. } | SweepOutcome::TimedOut
        )
    }

    pub fn summary(&self) -> Option<&SweepSummary> {
        match &self.outcome {
            SweepOutcome::Completed { summary } => Some(summary),
            _ => None,
        }
    }
}

/// Runs overstay sweeps against one database
#[derive(Clone)]
pub struct Sweeper {
    pool: PgPool,
    notifications: NotificationService,
    config: MonitorConfig,
}

impl Sweeper {
    pub fn new(pool: PgPool, notifications: NotificationService, config: MonitorConfig) -> Self {
        Self {
            pool,
            notifications,
            config,
        }
    }

    /// Runs one sweep as of `now` under the cross-process sweep lock and the
    /// configured time budget. Never returns an error: every failure ends up
    /// in the report and the log.
    pub async fn run(&self, now: DateTime<Utc>) -> SweepReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        log::info!(
            "=== Overstay sweep {} started (reference time {}) ===",
            run_id,
            now
        );

        let outcome = match SweepLock::try_acquire(&self.pool).await {
            Ok(Some(lock)) => {
                let outcome =
                    match tokio::time::timeout(self.config.time_budget, self.sweep_once(now)).await
                    {
                        Ok(Ok(summary)) => SweepOutcome::Completed { summary },
                        Ok(Err(e)) => {
                            log::error!("Overstay sweep failed: {}", e);
                            SweepOutcome::Failed {
                                error: e.to_string(),
                            }
                        }
                        Err(_) => {
                            log::error!(
                                "Overstay sweep exceeded its time budget of {}s, abandoned",
                                self.config.time_budget.as_secs()
                            );
                            SweepOutcome::TimedOut
                        }
                    };

                if let Err(e) = lock.release().await {
                    log::warn!("Failed to release sweep lock: {}", e);
                }
                outcome
            }
            Ok(None) => {
                log::info!("Another overstay sweep is running, skipping this one");
                SweepOutcome::Skipped
            }
            Err(e) => {
                log::error!("Could not take the sweep lock: {}", e);
                SweepOutcome::Failed {
                    error: AppError::Database(e).to_string(),
                }
            }
        };

        let report = SweepReport {
            run_id,
            reference_time: now,
            started_at,
            finished_at: Utc::now(),
            outcome,
        };
        log::info!(
            "=== Overstay sweep {} finished in {}ms ===",
            report.run_id,
            (report.finished_at - report.started_at).num_milliseconds()
        );
        report
    }

    /// The sweep itself, without locking or time budget.
    ///
    /// Settings, candidate and cleanup failures abort with an error; failures
    /// on a single visit are logged, counted and skipped.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> AppResult<SweepSummary> {
        let settings = SettingsService::load_monitor_settings(&self.pool).await?;
        log::info!(
            "Settings: max_visit_duration={}m overstay_warning_time={}m notifications={} email={}",
            settings.max_visit_duration,
            settings.overstay_warning_time,
            settings.enable_notifications,
            settings.email_notifications
        );

        let candidates =
            VisitService::find_sweep_candidates(&self.pool, now, APPROACHING_WINDOW_MINUTES).await?;

        let mut overstays = Vec::new();
        let mut approaching = Vec::new();
        for visit in candidates {
            match classify(visit.status, visit.elapsed_minutes, visit.expected_duration) {
                VisitClass::Overstay => overstays.push(visit),
                VisitClass::Approaching { remaining_minutes } => {
                    approaching.push((visit, remaining_minutes))
                }
                VisitClass::Clear => {}
            }
        }

        let mut summary = SweepSummary::default();

        log::info!("Found {} overstayed visits", overstays.len());
        for visit in &overstays {
            summary.overstays_processed += 1;
            if let Err(e) = self.process_overstay(visit, &settings, now, &mut summary).await {
                summary.failures += 1;
                log::error!("Failed to process overstay for visit {}: {}", visit.id, e);
            }
        }

        log::info!("Found {} visits approaching overstay", approaching.len());
        for (visit, remaining) in &approaching {
            summary.warnings_found += 1;
            match self.process_approaching(visit, *remaining).await {
                Ok(true) => summary.warning_alerts_created += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.failures += 1;
                    log::error!("Failed to raise warning for visit {}: {}", visit.id, e);
                }
            }
        }

        summary.alerts_cleaned = AlertService::purge_expired(&self.pool, now).await?;
        log::info!("Cleaned up {} old alerts", summary.alerts_cleaned);

        summary.audit_logs_cleaned = AuditService::purge_expired(&self.pool, now).await?;
        log::info!("Cleaned up {} old audit entries", summary.audit_logs_cleaned);

        log_summary(&summary);
        Ok(summary)
    }

    async fn process_overstay(
        &self,
        visit: &OpenVisit,
        settings: &MonitorSettings,
        now: DateTime<Utc>,
        summary: &mut SweepSummary,
    ) -> AppResult<()> {
        if visit.status == VisitStatus::Inside
            && VisitService::mark_overstayed(&self.pool, visit.id).await?
        {
            log::info!(
                "Visit {} ({}, flat {}) marked overstayed after {} of {} minutes",
                visit.id,
                visit.visitor_name,
                visit.flat_number,
                visit.elapsed_minutes,
                visit.expected_duration
            );
        }

        let alert = NewAlert {
            kind: AlertKind::Overstay,
            title: AlertKind::Overstay.title().to_string(),
            message: format!(
                "Visitor {} has exceeded their allocated time and is still on the premises.",
                visit.visitor_name
            ),
            severity: Severity::High,
            visit_id: Some(visit.id),
            flat_id: Some(visit.flat_id),
            guard_id: None,
            created_by: SYSTEM_ACTOR.to_string(),
        };
        if let Some(created) = AlertService::create_if_absent(&self.pool, &alert).await? {
            summary.overstay_alerts_created += 1;
            log::info!("Created overstay alert {} for visit {}", created.id, visit.id);
        }

        if !settings.should_email() {
            return Ok(());
        }

        if let Some(window) = self.config.renotify_window {
            let notified_recently = AuditService::exists_since(
                &self.pool,
                OVERSTAY_NOTIFIED_ACTION,
                VISIT_TABLE,
                visit.id,
                renotify_cutoff(now, window)?,
            )
            .await?;
            if notified_recently {
                log::info!(
                    "Visit {} already notified within {} minutes, not re-sending",
                    visit.id,
                    window.num_minutes()
                );
                return Ok(());
            }
        }

        if self
            .notifications
            .send_overstay_alert(&self.pool, visit.id, now)
            .await?
        {
            summary.notifications_sent += 1;
            AuditService::record_or_log(
                &self.pool,
                NewAuditEntry::new(OVERSTAY_NOTIFIED_ACTION, VISIT_TABLE, Some(visit.id))
                    .with_actor(SYSTEM_ACTOR)
                    .with_new_values(json!({ "elapsed_minutes": visit.elapsed_minutes })),
            )
            .await;
        } else {
            log::warn!("Overstay notification for visit {} reached nobody", visit.id);
        }

        Ok(())
    }

    /// Returns whether a new warning alert was created
    async fn process_approaching(&self, visit: &OpenVisit, remaining_minutes: i64) -> AppResult<bool> {
        let alert = NewAlert {
            kind: AlertKind::ApproachingOverstay,
            title: AlertKind::ApproachingOverstay.title().to_string(),
            message: format!(
                "Visitor {} will exceed their allocated time in {} minutes.",
                visit.visitor_name, remaining_minutes
            ),
            severity: Severity::Medium,
            visit_id: Some(visit.id),
            flat_id: Some(visit.flat_id),
            guard_id: None,
            created_by: SYSTEM_ACTOR.to_string(),
        };

        let created = AlertService::create_if_absent(&self.pool, &alert).await?;
        if let Some(created) = &created {
            log::info!(
                "Created approaching-overstay alert {} for visit {} ({} minutes left)",
                created.id,
                visit.id,
                remaining_minutes
            );
        }
        Ok(created.is_some())
    }
}

/// Start of the window in which an earlier overstay mail suppresses a new one
fn renotify_cutoff(now: DateTime<Utc>, window: chrono::Duration) -> AppResult<DateTime<Utc>> {
    now.checked_sub_signed(window).ok_or_else(|| {
        AppError::Internal(format!(
            "Re-notify window of {} minutes is out of range",
            window.num_minutes()
        ))
    })
}

fn log_summary(summary: &SweepSummary) {
    log::info!("=== Sweep Summary ===");
    log::info!("Overstays processed: {}", summary.overstays_processed);
    log::info!("Warnings found: {}", summary.warnings_found);
    log::info!("Alerts created: {}", summary.alerts_created());
    log::info!("Notifications sent: {}", summary.notifications_sent);
    log::info!("Failures: {}", summary.failures);
    log::info!("Alerts cleaned: {}", summary.alerts_cleaned);
    log::info!("Audit entries cleaned: {}", summary.audit_logs_cleaned);
}
