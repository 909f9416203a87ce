//! SMTP mail transport using lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Mailer, NotificationResult};
use crate::config::SmtpConfig;

/// Sends HTML mail through the configured SMTP relay
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Whether a relay host is configured at all
    pub fn is_configured(&self) -> bool {
        self.config.host.is_some()
    }

    fn transport(&self, host: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>, String> {
        let port = self.config.port;

        // 465 = implicit TLS, anything else = STARTTLS
        let builder = if port == 465 {
            let tls_params = TlsParameters::new(host.to_string())
                .map_err(|e| format!("Invalid TLS parameters for SMTP host: {}", e))?;
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map(|b| b.port(port).tls(Tls::Wrapper(tls_params)))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).map(|b| b.port(port))
        }
        .map_err(|e| format!("Invalid SMTP host: {}", e))?;

        let transport = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => builder
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            _ => builder.build(),
        };

        Ok(transport)
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> Result<Message, String> {
        let from: Mailbox = self
            .config
            .from_address
            .parse()
            .map_err(|e| format!("Invalid sender address '{}': {}", self.config.from_address, e))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient '{}': {}", to, e))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> NotificationResult {
        let host = match self.config.host.as_deref() {
            Some(h) => h,
            None => return NotificationResult::failure("SMTP host not configured"),
        };

        let message = match self.build_message(to, subject, html_body) {
            Ok(m) => m,
            Err(e) => return NotificationResult::failure(e),
        };

        let transport = match self.transport(host) {
            Ok(t) => t,
            Err(e) => return NotificationResult::failure(e),
        };

        match transport.send(message).await {
            Ok(_) => {
                log::debug!("Email sent to {}", to);
                NotificationResult::success()
            }
            Err(e) => NotificationResult::failure(format!("Failed to send email to {}: {}", to, e)),
        }
    }
}
