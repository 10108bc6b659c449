// --- File: crates/booking_common/src/http/client.rs ---
use once_cell::sync::Lazy;
use reqwest::{Client, Error as ReqwestError};
use std::time::Duration;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process-wide client shared by the email, calendar and contact providers.
///
/// Falls back to an unconfigured client if the builder fails, so the
/// per-request timeouts applied by callers still bound every call.
pub static HTTP_CLIENT: Lazy<Client> =
    Lazy::new(|| create_client(DEFAULT_TIMEOUT_SECS).unwrap_or_else(|_| Client::new()));

/// Creates a new HTTP client with the given overall request timeout.
pub fn create_client(timeout_secs: u64) -> Result<Client, ReqwestError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("booking/", env!("CARGO_PKG_VERSION")))
        .build()
}
