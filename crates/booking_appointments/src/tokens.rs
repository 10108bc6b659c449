// --- File: crates/booking_appointments/src/tokens.rs ---
//! Opaque tokens for self-service links and meeting rooms.
//!
//! Tokens are random (UUID v4, 122 bits) and carry no structure.
//! Whoever holds the cancellation token may cancel the appointment.

use uuid::Uuid;

/// 32 lowercase hex characters, URL-safe.
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentTokens {
    pub confirmation: String,
    pub cancellation: String,
}

impl AppointmentTokens {
    pub fn generate() -> Self {
        let confirmation = generate_token();
        let mut cancellation = generate_token();
        while cancellation == confirmation {
            cancellation = generate_token();
        }
        Self {
            confirmation,
            cancellation,
        }
    }
}

/// Room code in the `abc-defg-hij` shape used by meeting links.
pub fn meeting_code() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", &raw[0..3], &raw[3..7], &raw[7..10])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_thousand_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_pair_differs() {
        let tokens = AppointmentTokens::generate();
        assert_ne!(tokens.confirmation, tokens.cancellation);
    }

    #[test]
    fn test_meeting_code_shape() {
        let code = meeting_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![3, 4, 3]);
    }
}
