//! Notification delivery
//!
//! Sends composed notifications by email. The SMTP implementation opens a
//! fresh STARTTLS session per message; the poller sends at most one message
//! per cycle.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use stockwatch_core::notification::Notification;
use thiserror::Error;
use tracing::debug;

use crate::config::SmtpConfig;

/// Errors that can occur while delivering a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP username or password not configured
    #[error("SMTP credentials are not configured (set SMTP_USERNAME and SMTP_PASSWORD)")]
    MissingCredentials,

    /// Sender or recipient is not a valid mailbox
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// The message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The relay refused the connection, login or message
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Delivers notifications to a recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// SMTP implementation of Notifier
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Assembles the plaintext message
    fn build_message(
        &self,
        recipient: &str,
        notification: &Notification,
    ) -> Result<Message, NotifyError> {
        let sender = self.config.sender().ok_or(NotifyError::MissingCredentials)?;

        Message::builder()
            .from(parse_mailbox(sender)?)
            .to(parse_mailbox(recipient)?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, notification: &Notification) -> Result<(), NotifyError> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(NotifyError::MissingCredentials);
        };

        let message = self.build_message(recipient, notification)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.server)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .build();

        debug!(
            "Sending '{}' to {} via {}:{}",
            notification.subject, recipient, self.config.server, self.config.port
        );

        mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}
