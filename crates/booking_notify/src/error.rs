// --- File: crates/booking_notify/src/error.rs ---
use booking_common::{external_service_error, BookingError};
use thiserror::Error;

/// Failure of a single provider call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Non-2xx answer from the provider
    #[error("{provider} API error (status {status}): {message}")]
    ApiError {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Provider configuration missing or incomplete: {0}")]
    ConfigError(String),

    #[error("Failed to encode request: {0}")]
    EncodingError(String),

    #[error("Failed to render message body: {0}")]
    TemplateError(#[from] askama::Error),
}

impl From<ProviderError> for BookingError {
    fn from(err: ProviderError) -> Self {
        match &err {
            ProviderError::ApiError { provider, .. } => external_service_error(provider, &err),
            ProviderError::ConfigError(message) => BookingError::ConfigError(message.clone()),
            _ => external_service_error("notification", &err),
        }
    }
}

/// The mandatory confirmation email did not go out.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Confirmation email failed: {0}")]
    ConfirmationEmail(#[source] ProviderError),

    #[error("Confirmation email timed out after {0} seconds")]
    Timeout(u64),
}
