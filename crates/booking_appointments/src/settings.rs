// --- File: crates/booking_appointments/src/settings.rs ---
use booking_common::{config_error, BookingError};
use booking_config::{BookingConfig, SlotsConfig};
use chrono_tz::Tz;

/// Booking configuration with the time zone already parsed.
#[derive(Debug, Clone)]
pub struct BookingSettings {
    pub time_zone: Tz,
    pub default_client_time_zone: String,
    pub default_duration_minutes: i64,
    pub meeting_base_url: String,
    pub slots: SlotsConfig,
}

impl BookingSettings {
    pub fn from_config(config: &BookingConfig) -> Result<Self, BookingError> {
        let time_zone: Tz = config.time_zone.parse().map_err(|_| {
            config_error(format!("booking.time_zone '{}' is not a valid IANA zone", config.time_zone))
        })?;
        if config.default_duration_minutes <= 0 || config.slots.duration_minutes <= 0 {
            return Err(config_error("booking durations must be positive"));
        }

        Ok(Self {
            time_zone,
            default_client_time_zone: config.default_client_time_zone.clone(),
            default_duration_minutes: config.default_duration_minutes,
            meeting_base_url: config.meeting_base_url.trim_end_matches('/').to_string(),
            slots: config.slots.clone(),
        })
    }
}

impl Default for BookingSettings {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Africa::Abidjan,
            default_client_time_zone: "Europe/Paris".to_string(),
            default_duration_minutes: 60,
            meeting_base_url: "https://meet.google.com".to_string(),
            slots: SlotsConfig::default(),
        }
    }
}
