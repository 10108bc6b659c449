// --- File: crates/booking_appointments/src/routes.rs ---

use crate::handlers::{
    cancel_appointment_handler, confirm_appointment_handler, create_appointment_handler,
    create_service_handler, delete_appointment_handler, get_appointment_handler,
    get_service_handler, list_appointments_handler, list_services_handler,
    suggested_slots_handler, update_appointment_handler, AppointmentsState,
};
use crate::settings::BookingSettings;
use axum::{
    routing::{get, post},
    Router,
};
use booking_common::BookingError;
use booking_config::AppConfig;
use booking_db::{DbClient, SqlAppointmentRepository, SqlServiceRepository};
use booking_notify::NotificationDispatcher;
use std::sync::Arc;

/// Routes of the booking API, relative to the `/api` prefix.
pub fn routes(state: Arc<AppointmentsState>) -> Router {
    Router::new()
        .route(
            "/v1/appointments",
            get(list_appointments_handler)
                .post(create_appointment_handler)
                .put(update_appointment_handler)
                .delete(delete_appointment_handler),
        )
        .route("/v1/appointments/{id}", get(get_appointment_handler))
        .route(
            "/v1/appointments/confirm/{token}",
            post(confirm_appointment_handler),
        )
        .route(
            "/v1/appointments/cancel/{token}",
            post(cancel_appointment_handler),
        )
        .route(
            "/v1/appointments/suggested-slots/{service_id}",
            get(suggested_slots_handler),
        )
        .route(
            "/v1/services",
            get(list_services_handler).post(create_service_handler),
        )
        .route("/v1/services/{key}", get(get_service_handler))
        .with_state(state)
}

/// Builds the state from the loaded configuration and an open database.
///
/// Schemas are expected to exist already.
pub fn state_from_config(
    config: &AppConfig,
    db: DbClient,
    dispatcher: Arc<NotificationDispatcher>,
) -> Result<Arc<AppointmentsState>, BookingError> {
    let settings = BookingSettings::from_config(&config.booking)?;
    Ok(Arc::new(AppointmentsState {
        settings,
        services: SqlServiceRepository::new(db.clone()),
        appointments: SqlAppointmentRepository::new(db),
        dispatcher,
    }))
}
