// --- File: crates/booking_appointments/src/availability.rs ---
//! Slot availability.
//!
//! Windows are half-open `[start, end)`: back-to-back appointments do not
//! overlap. Every status except `cancelled` occupies its window.

use booking_common::{validation_error, Appointment, BookingError};
use booking_db::{AppointmentRepository, DbError};
use chrono::{DateTime, Duration, Timelike, Utc};

/// Longest consultation a service may declare: one day.
pub const MAX_CONSULTATION_MINUTES: i64 = 24 * 60;

pub const INVALID_DURATION: &str = "Durée de consultation invalide (1 à 1440 minutes)";
pub const UNALIGNED_START: &str = "L'heure de début doit être une minute entière";

/// End of a `minutes`-long window opening at `start`.
pub fn window_end(start: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, BookingError> {
    if !(1..=MAX_CONSULTATION_MINUTES).contains(&minutes) {
        return Err(validation_error(INVALID_DURATION));
    }
    Duration::try_minutes(minutes)
        .and_then(|length| start.checked_add_signed(length))
        .ok_or_else(|| validation_error(INVALID_DURATION))
}

/// Appointments start on a whole minute.
pub fn ensure_minute_aligned(start: DateTime<Utc>) -> Result<(), BookingError> {
    if start.second() != 0 || start.nanosecond() != 0 {
        return Err(validation_error(UNALIGNED_START));
    }
    Ok(())
}

pub fn windows_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether `[start, end)` is clear of every blocking appointment in `existing`.
pub fn is_free_among(start: DateTime<Utc>, end: DateTime<Utc>, existing: &[Appointment]) -> bool {
    !existing.iter().any(|appointment| {
        appointment.status.blocks_slot()
            && windows_overlap(appointment.start(), appointment.end(), start, end)
    })
}

pub struct SlotAvailabilityChecker<'a, R> {
    appointments: &'a R,
}

impl<'a, R: AppointmentRepository + Sync> SlotAvailabilityChecker<'a, R> {
    pub fn new(appointments: &'a R) -> Self {
        Self { appointments }
    }

    /// `exclude_id` leaves one appointment out, for re-checks during an update.
    ///
    /// Advisory only: the insert and update paths repeat the check atomically.
    pub async fn is_available(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        Ok(!self.appointments.has_overlap(start, end, exclude_id).await?)
    }
}
