//! Repository for appointments
//!
//! Every write that can occupy a window goes through a single conditional
//! statement, so two concurrent bookings for overlapping windows cannot both
//! succeed.

use crate::error::DbError;
use booking_common::{Appointment, AppointmentStatus, NotificationChannel};
use chrono::{DateTime, Utc};
use std::future::Future;

pub trait AppointmentRepository {
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Insert `appointment` unless a blocking appointment overlaps its window.
    ///
    /// On success the booked service's counter is incremented in the same
    /// transaction. Returns `false`, with nothing written, on overlap.
    fn insert_if_available(
        &self,
        appointment: &Appointment,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Whether a blocking appointment other than `exclude_id` overlaps `[start, end)`.
    fn has_overlap(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Blocking appointments intersecting `[from, to)`, earliest first.
    fn find_blocking_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    fn list(
        &self,
        status: Option<AppointmentStatus>,
    ) -> impl Future<Output = Result<Vec<Appointment>, DbError>> + Send;

    fn find_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    fn find_by_confirmation_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    fn find_by_cancellation_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Appointment>, DbError>> + Send;

    /// Overwrite the stored record. Returns `false` if the id is unknown.
    fn update(&self, appointment: &Appointment)
        -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Overwrite the stored record unless its new window overlaps another
    /// blocking appointment or its stored status is no longer `expected`.
    /// Returns `false` if nothing was written.
    fn update_if_available(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Overwrite the stored record only while its stored status is still `expected`.
    fn replace_if_status(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    fn mark_notification_sent(
        &self,
        id: &str,
        channel: NotificationChannel,
        sent_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Number of appointments, in any status, booked with this client email.
    fn count_for_client(&self, email: &str) -> impl Future<Output = Result<i64, DbError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, DbError>> + Send;
}
