//! Notifier contract (plaintext email delivery).

use async_trait::async_trait;
use thiserror::Error;

/// A plaintext email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("email delivery failed: {0}")]
    Send(String),
}

/// Sends mail. Failures here must never abort registration; the lifecycle
/// controller logs and swallows them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}
