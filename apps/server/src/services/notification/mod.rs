//! Visitor mail notifications.
//!
//! Delivery goes through the [`Mailer`] trait so the SMTP transport can be
//! swapped for a recording double in tests. [`NotificationService`] renders
//! the templates, picks recipients and audits every attempt.

pub mod dispatcher;
pub mod email;
pub mod templates;

use async_trait::async_trait;

pub use dispatcher::NotificationService;
pub use email::SmtpMailer;

// =============================================================================
// Notification Result
// =============================================================================

/// Outcome of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub success: bool,
    pub error_message: Option<String>,
}

impl NotificationResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error_message: None,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(error_message.into()),
        }
    }
}

// =============================================================================
// Mailer Trait
// =============================================================================

/// Fire-and-forget mail transport. Implementations never retry.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> NotificationResult;
}
