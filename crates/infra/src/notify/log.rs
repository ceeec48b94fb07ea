use async_trait::async_trait;

use gatehouse_accounts::{EmailMessage, Notifier, NotifyError};

/// Dev notifier: logs the message instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "email (not delivered; SMTP not configured)"
        );
        Ok(())
    }
}
