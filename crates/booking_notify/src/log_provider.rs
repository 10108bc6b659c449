// --- File: crates/booking_notify/src/log_provider.rs ---
use crate::error::ProviderError;
use crate::provider::{EmailMessage, EmailProvider, EmailReceipt};
use async_trait::async_trait;
use tracing::info;

/// Writes emails to the log instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogEmailProvider;

#[async_trait]
impl EmailProvider for LogEmailProvider {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send_email(&self, message: &EmailMessage) -> Result<EmailReceipt, ProviderError> {
        info!(
            to = %message.to_email,
            subject = %message.subject,
            "Email not sent (log provider):\n{}",
            message.text
        );
        Ok(EmailReceipt {
            provider: "log",
            message_id: None,
        })
    }
}
