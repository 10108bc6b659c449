// --- File: crates/booking_appointments/src/suggestions.rs ---
//! Candidate slots offered to the client, per period of the day.

use crate::availability::{is_free_among, window_end};
use crate::builder::local_to_utc;
use booking_common::{validation_error, Appointment, BookingError};
use booking_config::SlotsConfig;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 3] = [DayPeriod::Morning, DayPeriod::Afternoon, DayPeriod::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
        }
    }

    fn start_times<'a>(&self, slots: &'a SlotsConfig) -> &'a [String] {
        match self {
            DayPeriod::Morning => &slots.morning,
            DayPeriod::Afternoon => &slots.afternoon,
            DayPeriod::Evening => &slots.evening,
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayPeriod {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(DayPeriod::Morning),
            "afternoon" => Ok(DayPeriod::Afternoon),
            "evening" => Ok(DayPeriod::Evening),
            other => Err(validation_error(format!(
                "Préférence inconnue: {} (morning, afternoon, evening)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SuggestedSlot {
    #[cfg_attr(feature = "openapi", schema(example = "developpement-web-2025-03-10-09:00"))]
    pub id: String,
    /// `HH:MM`, business time zone
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub start_time: String,
    #[cfg_attr(feature = "openapi", schema(example = "10:00"))]
    pub end_time: String,
    /// Minutes
    pub duration: i64,
    #[cfg_attr(feature = "openapi", schema(example = "9h00 - 10h00"))]
    pub label: String,
    pub available: bool,
    pub period: DayPeriod,
    pub price: Option<f64>,
}

fn hour_label(time: NaiveTime) -> String {
    format!("{}h{:02}", time.hour(), time.minute())
}

/// Candidate slots for `preference`, or for every period in day order.
///
/// Entries of the configuration that are not `HH:MM` are skipped.
pub fn generate_slots(
    service_id: &str,
    preference: Option<DayPeriod>,
    date: Option<NaiveDate>,
    slots: &SlotsConfig,
    price: Option<f64>,
) -> Vec<SuggestedSlot> {
    let periods = match preference {
        Some(period) => vec![period],
        None => DayPeriod::ALL.to_vec(),
    };
    let date_part = date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "any".to_string());
    let duration = Duration::minutes(slots.duration_minutes);

    periods
        .into_iter()
        .flat_map(|period| {
            period
                .start_times(slots)
                .iter()
                .filter_map(move |raw| NaiveTime::parse_from_str(raw, "%H:%M").ok().map(|t| (period, t)))
        })
        .map(|(period, start)| {
            let end = start + duration;
            let start_time = start.format("%H:%M").to_string();
            SuggestedSlot {
                id: format!("{}-{}-{}", service_id, date_part, start_time),
                end_time: end.format("%H:%M").to_string(),
                duration: slots.duration_minutes,
                label: format!("{} - {}", hour_label(start), hour_label(end)),
                available: true,
                period,
                price,
                start_time,
            }
        })
        .collect()
}

/// UTC window a slot would occupy on `date` for a consultation of `minutes`.
pub fn slot_window(
    slot: &SuggestedSlot,
    date: NaiveDate,
    zone: Tz,
    minutes: i64,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let time = NaiveTime::parse_from_str(&slot.start_time, "%H:%M").ok()?;
    let start = local_to_utc(zone, date, time).ok()?;
    Some((start, window_end(start, minutes).ok()?))
}

/// Drops the slots whose window overlaps a blocking appointment.
pub fn remove_booked(
    slots: Vec<SuggestedSlot>,
    date: NaiveDate,
    zone: Tz,
    minutes: i64,
    booked: &[Appointment],
) -> Vec<SuggestedSlot> {
    slots
        .into_iter()
        .filter(|slot| match slot_window(slot, date, zone, minutes) {
            Some((start, end)) => is_free_among(start, end, booked),
            None => false,
        })
        .collect()
}
