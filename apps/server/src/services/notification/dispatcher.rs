//! Recipient selection, rendering and audited delivery.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;

use super::templates::{self, RenderedMail};
use super::Mailer;
use crate::error::AppResult;
use crate::models::NewAuditEntry;
use crate::services::{AuditService, UsersService, VisitService};

/// Audit action recorded for every delivery attempt
pub const EMAIL_SENT_ACTION: &str = "email_sent";
pub const MAIL_LOG_TABLE: &str = "mail_logs";

/// Sends visitor notifications through a [`Mailer`]
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    site_name: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, site_name: impl Into<String>) -> Self {
        Self {
            mailer,
            site_name: site_name.into(),
        }
    }

    /// Mails an overstay alert for the visit to every active admin and
    /// security user.
    ///
    /// Returns `Ok(false)` when the visit does not exist or no send
    /// succeeded. Individual failures are logged and do not stop the rest.
    pub async fn send_overstay_alert(
        &self,
        pool: &PgPool,
        visit_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let visit = match VisitService::get_details(pool, visit_id).await? {
            Some(v) => v,
            None => {
                log::warn!("Overstay alert skipped: visit {} not found", visit_id);
                return Ok(false);
            }
        };

        let elapsed_minutes = (now - visit.check_in_time).num_minutes();
        let mail = templates::overstay_alert(&self.site_name, &visit, elapsed_minutes, now);

        let recipients = UsersService::overstay_recipients(pool).await?;
        if recipients.is_empty() {
            log::warn!("No active admin or security users to notify about visit {}", visit_id);
        }

        let mut delivered = 0usize;
        for to in &recipients {
            if self.deliver(pool, to, &mail).await {
                delivered += 1;
            }
        }

        log::info!(
            "Overstay alert for visit {} delivered to {}/{} recipients",
            visit_id,
            delivered,
            recipients.len()
        );

        Ok(delivered > 0)
    }

    /// Mails the flat owner that a visitor checked in. A flat without an
    /// owner email is a successful no-op.
    pub async fn send_checkin_notification(
        &self,
        pool: &PgPool,
        visit_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let visit = match VisitService::get_details(pool, visit_id).await? {
            Some(v) => v,
            None => return Ok(false),
        };

        if let Some(owner_email) = visit.owner_email.as_deref().filter(|e| !e.is_empty()) {
            let mail = templates::checkin_notice(&self.site_name, &visit, now);
            self.deliver(pool, owner_email, &mail).await;
        }

        Ok(true)
    }

    /// Mails the flat owner that a visitor checked out. Visits still open
    /// are reported up to `now`.
    pub async fn send_checkout_notification(
        &self,
        pool: &PgPool,
        visit_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let visit = match VisitService::get_details(pool, visit_id).await? {
            Some(v) => v,
            None => return Ok(false),
        };

        if let Some(owner_email) = visit.owner_email.as_deref().filter(|e| !e.is_empty()) {
            let checked_out_at = visit.check_out_time.unwrap_or(now);
            let mail = templates::checkout_notice(&self.site_name, &visit, checked_out_at, now);
            self.deliver(pool, owner_email, &mail).await;
        }

        Ok(true)
    }

    /// Sends one mail and audits the attempt whatever its outcome
    async fn deliver(&self, pool: &PgPool, to: &str, mail: &RenderedMail) -> bool {
        let result = self.mailer.send(to, &mail.subject, &mail.html_body).await;

        if !result.success {
            log::warn!(
                "Failed to send '{}' to {}: {}",
                mail.subject,
                to,
                result.error_message.as_deref().unwrap_or("unknown error")
            );
        }

        AuditService::record_or_log(
            pool,
            NewAuditEntry::new(EMAIL_SENT_ACTION, MAIL_LOG_TABLE, None).with_new_values(json!({
                "to": to,
                "subject": mail.subject,
                "success": result.success,
            })),
        )
        .await;

        result.success
    }
}
