// --- File: crates/booking_appointments/src/handlers.rs ---
use crate::builder::{BookingRequest, RequestMetadata};
use crate::logic::{self, AppointmentUpdate, ServiceListQuery, SuggestedSlotsResponse};
use crate::settings::BookingSettings;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use booking_common::{validation_error, ApiResponse, Appointment, BookingError, Service};
use booking_db::{SqlAppointmentRepository, SqlServiceRepository};
use booking_notify::NotificationDispatcher;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Shared state of the booking routes.
pub struct AppointmentsState {
    pub settings: BookingSettings,
    pub services: SqlServiceRepository,
    pub appointments: SqlAppointmentRepository,
    pub dispatcher: Arc<NotificationDispatcher>,
}

#[derive(Debug, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct StatusQuery {
    /// pending, scheduled, confirmed or cancelled
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SuggestionQuery {
    /// morning, afternoon or evening
    pub preference: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

fn bad_json(rejection: JsonRejection) -> BookingError {
    debug!("Rejected request body: {}", rejection.body_text());
    validation_error(format!("Requête invalide: {}", rejection.body_text()))
}

fn bad_query(rejection: QueryRejection) -> BookingError {
    validation_error(format!("Paramètres invalides: {}", rejection.body_text()))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/v1/appointments",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Appointment created, notification outcome included", body = crate::logic::CreatedAppointment),
        (status = 400, description = "Missing field, invalid email or missing GDPR consent"),
        (status = 404, description = "Unknown or inactive service"),
        (status = 409, description = "Slot already taken"),
        (status = 500, description = "Appointment stored but the confirmation email failed")
    ),
    tag = "Appointments"
))]
pub async fn create_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    headers: HeaderMap,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Json(request) = payload.map_err(bad_json)?;
    let metadata = RequestMetadata::from_headers(&headers);

    let created = logic::create_appointment(
        &state.services,
        &state.appointments,
        &state.dispatcher,
        &state.settings,
        request,
        &metadata,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Rendez-vous créé avec succès"),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/v1/appointments",
    params(StatusQuery),
    responses(
        (status = 200, description = "Appointments ordered by start time", body = [Appointment]),
        (status = 400, description = "Unknown status")
    ),
    tag = "Appointments"
))]
pub async fn list_appointments_handler(
    State(state): State<Arc<AppointmentsState>>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<Appointment>>, BookingError> {
    let Query(query) = query.map_err(bad_query)?;
    let appointments = logic::list_appointments(&state.appointments, query.status.as_deref()).await?;
    Ok(ApiResponse::ok(appointments))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/v1/appointments/{id}",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "The appointment", body = Appointment),
        (status = 404, description = "Unknown appointment")
    ),
    tag = "Appointments"
))]
pub async fn get_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Appointment>, BookingError> {
    let appointment = logic::get_appointment(&state.appointments, &id).await?;
    Ok(ApiResponse::ok(appointment))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/v1/appointments",
    request_body = AppointmentUpdate,
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 400, description = "Missing _id or malformed field"),
        (status = 404, description = "Unknown appointment"),
        (status = 409, description = "Invalid status transition or slot taken")
    ),
    tag = "Appointments"
))]
pub async fn update_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    payload: Result<Json<AppointmentUpdate>, JsonRejection>,
) -> Result<ApiResponse<Appointment>, BookingError> {
    let Json(update) = payload.map_err(bad_json)?;
    let updated = logic::update_appointment(&state.appointments, &state.settings, update).await?;
    Ok(ApiResponse::with_message(
        updated,
        "Rendez-vous mis à jour avec succès",
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/v1/appointments",
    params(IdQuery),
    responses(
        (status = 200, description = "Appointment deleted"),
        (status = 400, description = "Missing id"),
        (status = 404, description = "Unknown appointment")
    ),
    tag = "Appointments"
))]
pub async fn delete_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    query: Result<Query<IdQuery>, QueryRejection>,
) -> Result<ApiResponse<Option<()>>, BookingError> {
    let Query(query) = query.map_err(bad_query)?;
    logic::delete_appointment(&state.appointments, query.id.as_deref()).await?;
    Ok(ApiResponse::with_message(
        None,
        "Rendez-vous supprimé avec succès",
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/v1/appointments/confirm/{token}",
    params(("token" = String, Path, description = "Confirmation token from the email")),
    responses(
        (status = 200, description = "Appointment confirmed", body = Appointment),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Appointment cancelled")
    ),
    tag = "Appointments"
))]
pub async fn confirm_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    Path(token): Path<String>,
) -> Result<ApiResponse<Appointment>, BookingError> {
    let appointment = logic::confirm_by_token(&state.appointments, &token).await?;
    Ok(ApiResponse::with_message(appointment, "Rendez-vous confirmé"))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/v1/appointments/cancel/{token}",
    params(("token" = String, Path, description = "Cancellation token from the email")),
    responses(
        (status = 200, description = "Appointment cancelled, its slot is free again", body = Appointment),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Already cancelled")
    ),
    tag = "Appointments"
))]
pub async fn cancel_appointment_handler(
    State(state): State<Arc<AppointmentsState>>,
    Path(token): Path<String>,
) -> Result<ApiResponse<Appointment>, BookingError> {
    let appointment = logic::cancel_by_token(&state.appointments, &token).await?;
    Ok(ApiResponse::with_message(appointment, "Rendez-vous annulé"))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/v1/appointments/suggested-slots/{service_id}",
    params(
        ("service_id" = String, Path, description = "Service id or slug"),
        SuggestionQuery
    ),
    responses(
        (status = 200, description = "Candidate slots, booked ones removed when a date is given", body = SuggestedSlotsResponse),
        (status = 400, description = "Unknown preference or malformed date"),
        (status = 404, description = "Unknown service")
    ),
    tag = "Appointments"
))]
pub async fn suggested_slots_handler(
    State(state): State<Arc<AppointmentsState>>,
    Path(service_id): Path<String>,
    query: Result<Query<SuggestionQuery>, QueryRejection>,
) -> Result<ApiResponse<SuggestedSlotsResponse>, BookingError> {
    let Query(query) = query.map_err(bad_query)?;
    let response = logic::suggested_slots(
        &state.services,
        &state.appointments,
        &state.settings,
        &service_id,
        query.preference.as_deref(),
        query.date.as_deref(),
    )
    .await?;
    Ok(ApiResponse::ok(response))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/v1/services",
    params(ServiceListQuery),
    responses((status = 200, description = "Catalog ordered by display order", body = [Service])),
    tag = "Services"
))]
pub async fn list_services_handler(
    State(state): State<Arc<AppointmentsState>>,
    query: Result<Query<ServiceListQuery>, QueryRejection>,
) -> Result<ApiResponse<Vec<Service>>, BookingError> {
    let Query(query) = query.map_err(bad_query)?;
    let services = logic::list_services(&state.services, &query).await?;
    Ok(ApiResponse::ok(services))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/v1/services/{key}",
    params(("key" = String, Path, description = "Service id or slug")),
    responses(
        (status = 200, description = "The service", body = Service),
        (status = 404, description = "Unknown service")
    ),
    tag = "Services"
))]
pub async fn get_service_handler(
    State(state): State<Arc<AppointmentsState>>,
    Path(key): Path<String>,
) -> Result<ApiResponse<Service>, BookingError> {
    let service = logic::get_service(&state.services, &key).await?;
    Ok(ApiResponse::ok(service))
}

#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/v1/services",
    request_body = Service,
    responses(
        (status = 201, description = "Service created", body = Service),
        (status = 400, description = "Invalid body"),
        (status = 409, description = "Slug already used")
    ),
    tag = "Services"
))]
pub async fn create_service_handler(
    State(state): State<Arc<AppointmentsState>>,
    payload: Result<Json<Service>, JsonRejection>,
) -> Result<impl IntoResponse, BookingError> {
    let Json(service) = payload.map_err(bad_json)?;
    let created = logic::create_service(&state.services, service).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "Service créé avec succès"),
    ))
}
