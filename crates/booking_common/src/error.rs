// --- File: crates/booking_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The error type surfaced by every booking endpoint.
///
/// Crate-local errors (`DbError`, `ProviderError`, `DispatchError`) convert into
/// this type, which then decides the HTTP status through [`HttpStatusCode`].
/// Display strings of the validation, conflict and not-found variants are
/// shown to end users as-is.
#[derive(Error, Debug)]
pub enum BookingError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Input rejected before anything was persisted
    #[error("{0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A downstream provider answered with a failure
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// The requested slot or resource is already taken
    #[error("{0}")]
    ConflictError(String),

    #[error("{0}")]
    NotFoundError(String),

    /// The appointment exists but its mandatory confirmation could not be delivered
    #[error("{0}")]
    NotificationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BookingError {
    fn status_code(&self) -> u16 {
        match self {
            BookingError::ConfigError(_) => 500,
            BookingError::ValidationError(_) => 400,
            BookingError::DatabaseError(_) => 500,
            BookingError::ExternalServiceError { .. } => 502,
            BookingError::ConflictError(_) => 409,
            BookingError::NotFoundError(_) => 404,
            BookingError::NotificationError(_) => 500,
            BookingError::InternalError(_) => 500,
        }
    }
}

impl From<std::io::Error> for BookingError {
    fn from(err: std::io::Error) -> Self {
        BookingError::InternalError(err.to_string())
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> BookingError {
    BookingError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> BookingError {
    BookingError::ValidationError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> BookingError {
    BookingError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> BookingError {
    BookingError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> BookingError {
    BookingError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}
