// --- File: crates/booking_notify/src/provider.rs ---
//! Strategy traits for the outbound integrations.
//!
//! Which implementation backs each trait is decided once, from configuration,
//! when the dispatcher is built.

use crate::error::ProviderError;
use async_trait::async_trait;
use booking_common::Appointment;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: String,
    /// Plain-text alternative.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailReceipt {
    pub provider: &'static str,
    /// Provider-side message id, when the provider returns one.
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Created,
    /// The provider already knew this contact. Counts as success.
    AlreadyExists,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    async fn send_email(&self, message: &EmailMessage) -> Result<EmailReceipt, ProviderError>;
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Create a calendar event for the appointment and return its id.
    async fn create_event(&self, appointment: &Appointment) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ContactProvider: Send + Sync {
    async fn upsert_contact(&self, appointment: &Appointment)
        -> Result<ContactOutcome, ProviderError>;
}
