// --- File: crates/booking_notify/src/lib.rs ---

pub mod brevo; // Brevo transactional email
pub mod dispatcher; // Post-booking notification steps
pub mod error;
pub mod factory; // Provider selection from config
pub mod graph; // Microsoft Graph mail, calendar and contacts
pub mod log_provider;
pub mod provider; // Strategy traits
pub mod templates; // Email bodies

#[cfg(test)]
mod test_support;

pub use dispatcher::{
    DispatchReport, DispatchSummary, NotificationDispatcher, NotificationStep, StepOutcome,
};
pub use error::{DispatchError, ProviderError};
pub use factory::build_dispatcher;
pub use provider::{
    CalendarProvider, ContactOutcome, ContactProvider, EmailMessage, EmailProvider, EmailReceipt,
};
pub use templates::EmailTemplates;
