// --- File: crates/booking_appointments/src/logic.rs ---
//! Booking workflow.
//!
//! Creation runs validate, load service, build, conditional insert and
//! notify, in that order. Nothing is written before validation passes and the
//! insert is the only place where a window gets claimed.

use crate::availability::{
    ensure_minute_aligned, window_end, SlotAvailabilityChecker, INVALID_DURATION,
    MAX_CONSULTATION_MINUTES,
};
use crate::builder::{local_to_utc, AppointmentBuilder, BookingRequest, RequestMetadata};
use crate::settings::BookingSettings;
use crate::suggestions::{generate_slots, remove_booked, slot_window, DayPeriod, SuggestedSlot};
use booking_common::{
    conflict, not_found, validation_error, Appointment, AppointmentStatus, BookingError,
    LocationKind, NotificationChannel, ProjectContext, Service,
};
use booking_db::{AppointmentRepository, ServiceFilter, ServiceRepository};
use booking_notify::{DispatchSummary, NotificationDispatcher};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const SLOT_TAKEN: &str = "Ce créneau est déjà réservé";
pub const SERVICE_NOT_FOUND: &str = "Service non trouvé ou indisponible";
pub const APPOINTMENT_NOT_FOUND: &str = "Rendez-vous non trouvé";
pub const ID_REQUIRED: &str = "ID du rendez-vous requis";
pub const CHANGED_MEANWHILE: &str = "Le rendez-vous a été modifié entre-temps";

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatedAppointment {
    pub appointment: Appointment,
    pub notifications: DispatchSummary,
}

/// Fields an administrator may change. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentUpdate {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,
    pub status: Option<AppointmentStatus>,
    /// Moves the appointment; the duration is kept.
    pub start_time: Option<DateTime<Utc>>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
    pub project: Option<ProjectContext>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SuggestedSlotsResponse {
    pub service_id: String,
    pub preference: Option<DayPeriod>,
    pub date: Option<String>,
    pub suggested_slots: Vec<SuggestedSlot>,
}

async fn load_bookable_service<S: ServiceRepository + Sync>(
    services: &S,
    key: &str,
) -> Result<Service, BookingError> {
    services
        .find_by_id_or_slug(key)
        .await?
        .filter(|service| service.is_active)
        .ok_or_else(|| not_found(SERVICE_NOT_FOUND))
}

pub async fn create_appointment<S, A>(
    services: &S,
    appointments: &A,
    dispatcher: &NotificationDispatcher,
    settings: &BookingSettings,
    request: BookingRequest,
    metadata: &RequestMetadata,
) -> Result<CreatedAppointment, BookingError>
where
    S: ServiceRepository + Sync,
    A: AppointmentRepository + Sync,
{
    let draft = request.validate(settings)?;
    let service = load_bookable_service(services, &draft.service_key).await?;
    let returning_client = appointments.count_for_client(&draft.client_email).await? > 0;

    let mut appointment = AppointmentBuilder::new(settings).build(
        draft,
        &service,
        metadata,
        returning_client,
        Utc::now(),
    )?;
    debug!(
        "Booking {} for {} at {}",
        service.slug, appointment.client.email, appointment.appointment.start_time
    );

    if !appointments.insert_if_available(&appointment).await? {
        info!(
            "Slot {} {} already taken",
            appointment.appointment.date, appointment.appointment.time
        );
        return Err(conflict(SLOT_TAKEN));
    }
    info!(
        "Appointment {} created ({} {} {})",
        appointment.id, service.slug, appointment.appointment.date, appointment.appointment.time
    );

    let report = dispatcher.dispatch(&appointment).await.map_err(|e| {
        BookingError::NotificationError(format!(
            "Le rendez-vous {} est enregistré mais l'email de confirmation n'a pas pu être envoyé: {}",
            appointment.id, e
        ))
    })?;

    let sent_at = Utc::now();
    match appointments
        .mark_notification_sent(&appointment.id, NotificationChannel::Confirmation, sent_at)
        .await
    {
        Ok(_) => {
            let flag = appointment
                .notifications
                .flag_mut(NotificationChannel::Confirmation);
            flag.sent = true;
            flag.sent_at = Some(sent_at);
            appointment.updated_at = sent_at;
        }
        Err(e) => warn!(
            "Could not record confirmation email for {}: {}",
            appointment.id, e
        ),
    }

    Ok(CreatedAppointment {
        appointment,
        notifications: report.summary(),
    })
}

pub async fn list_appointments<A: AppointmentRepository + Sync>(
    appointments: &A,
    status: Option<&str>,
) -> Result<Vec<Appointment>, BookingError> {
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<AppointmentStatus>().map_err(validation_error)?),
        None => None,
    };
    Ok(appointments.list(status).await?)
}

pub async fn get_appointment<A: AppointmentRepository + Sync>(
    appointments: &A,
    id: &str,
) -> Result<Appointment, BookingError> {
    appointments
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(APPOINTMENT_NOT_FOUND))
}

/// New start from `startTime`, or from `date`/`time` read in the business zone.
fn requested_start(
    update: &AppointmentUpdate,
    current: &Appointment,
    settings: &BookingSettings,
) -> Result<Option<DateTime<Utc>>, BookingError> {
    if let Some(start) = update.start_time {
        ensure_minute_aligned(start)?;
        return Ok(Some(start));
    }
    if update.date.is_none() && update.time.is_none() {
        return Ok(None);
    }

    let date = update.date.as_deref().unwrap_or(&current.appointment.date);
    let time = update.time.as_deref().unwrap_or(&current.appointment.time);
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| validation_error("Format de date invalide (AAAA-MM-JJ)"))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| validation_error("Format d'heure invalide (HH:MM)"))?;
    local_to_utc(settings.time_zone, date, time).map(Some)
}

pub async fn update_appointment<A: AppointmentRepository + Sync>(
    appointments: &A,
    settings: &BookingSettings,
    update: AppointmentUpdate,
) -> Result<Appointment, BookingError> {
    let id = update
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| validation_error(ID_REQUIRED))?;
    let current = get_appointment(appointments, &id).await?;
    let mut updated = current.clone();

    if let Some(next) = update.status {
        if !current.status.can_transition_to(next) {
            return Err(conflict(format!(
                "Transition de statut invalide: {} -> {}",
                current.status, next
            )));
        }
        updated.status = next;
    }
    if let Some(message) = update.message.clone() {
        updated.message = Some(message);
    }
    if let Some(project) = update.project.clone() {
        updated.project = Some(project);
    }
    if let Some(phone) = update.phone.clone() {
        updated.client.phone = Some(phone);
    }
    if let Some(company) = update.company.clone() {
        updated.client.company = Some(company);
    }
    if let Some(address) = update.address.clone() {
        if updated.appointment.location.kind == LocationKind::InPerson {
            updated.appointment.location.address = Some(address);
        }
    }

    let moved = match requested_start(&update, &current, settings)? {
        Some(start) if start != current.start() => {
            let local = start.with_timezone(&settings.time_zone);
            updated.appointment.start_time = start;
            updated.appointment.end_time = window_end(start, current.appointment.duration)?;
            updated.appointment.date = local.format("%Y-%m-%d").to_string();
            updated.appointment.time = local.format("%H:%M").to_string();
            true
        }
        _ => false,
    };
    updated.updated_at = Utc::now();

    let stored = if moved && updated.status.blocks_slot() {
        let checker = SlotAvailabilityChecker::new(appointments);
        if !checker
            .is_available(updated.start(), updated.end(), Some(&updated.id))
            .await?
        {
            return Err(conflict(SLOT_TAKEN));
        }
        appointments
            .update_if_available(&updated, current.status)
            .await?
    } else {
        appointments
            .replace_if_status(&updated, current.status)
            .await?
    };

    if !stored {
        // Either the window was claimed or the record changed since it was read.
        let still_current = appointments
            .find_by_id(&updated.id)
            .await?
            .is_some_and(|stored| stored.status == current.status);
        return Err(conflict(if moved && still_current {
            SLOT_TAKEN
        } else {
            CHANGED_MEANWHILE
        }));
    }

    info!("Appointment {} updated ({})", updated.id, updated.status);
    Ok(updated)
}

pub async fn delete_appointment<A: AppointmentRepository + Sync>(
    appointments: &A,
    id: Option<&str>,
) -> Result<(), BookingError> {
    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| validation_error(ID_REQUIRED))?;
    if !appointments.delete(id).await? {
        return Err(not_found(APPOINTMENT_NOT_FOUND));
    }
    info!("Appointment {} deleted", id);
    Ok(())
}

/// Client confirmation through the emailed link. Confirming twice is harmless.
pub async fn confirm_by_token<A: AppointmentRepository + Sync>(
    appointments: &A,
    token: &str,
) -> Result<Appointment, BookingError> {
    let current = appointments
        .find_by_confirmation_token(token)
        .await?
        .ok_or_else(|| not_found(APPOINTMENT_NOT_FOUND))?;

    match current.status {
        AppointmentStatus::Confirmed => return Ok(current),
        AppointmentStatus::Cancelled => {
            return Err(conflict("Ce rendez-vous a été annulé"));
        }
        AppointmentStatus::Pending | AppointmentStatus::Scheduled => {}
    }

    let mut confirmed = current.clone();
    confirmed.status = AppointmentStatus::Confirmed;
    confirmed.updated_at = Utc::now();
    if !appointments
        .replace_if_status(&confirmed, current.status)
        .await?
    {
        return Err(conflict(CHANGED_MEANWHILE));
    }

    info!("Appointment {} confirmed by client", confirmed.id);
    Ok(confirmed)
}

/// Cancellation through the emailed link. The token works once.
pub async fn cancel_by_token<A: AppointmentRepository + Sync>(
    appointments: &A,
    token: &str,
) -> Result<Appointment, BookingError> {
    let current = appointments
        .find_by_cancellation_token(token)
        .await?
        .ok_or_else(|| not_found(APPOINTMENT_NOT_FOUND))?;
    if current.status == AppointmentStatus::Cancelled {
        return Err(conflict("Ce rendez-vous est déjà annulé"));
    }

    let mut cancelled = current.clone();
    cancelled.status = AppointmentStatus::Cancelled;
    cancelled.updated_at = Utc::now();
    if !appointments
        .replace_if_status(&cancelled, current.status)
        .await?
    {
        return Err(conflict("Ce rendez-vous est déjà annulé"));
    }

    info!("Appointment {} cancelled by client", cancelled.id);
    Ok(cancelled)
}

pub async fn suggested_slots<S, A>(
    services: &S,
    appointments: &A,
    settings: &BookingSettings,
    service_key: &str,
    preference: Option<&str>,
    date: Option<&str>,
) -> Result<SuggestedSlotsResponse, BookingError>
where
    S: ServiceRepository + Sync,
    A: AppointmentRepository + Sync,
{
    let preference = match preference.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => Some(raw.parse::<DayPeriod>()?),
        None => None,
    };
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| validation_error("Format de date invalide (AAAA-MM-JJ)"))?,
        ),
        None => None,
    };

    let service = load_bookable_service(services, service_key).await?;
    let minutes = service.consultation_minutes(settings.default_duration_minutes);
    if !(1..=MAX_CONSULTATION_MINUTES).contains(&minutes) {
        return Err(validation_error(INVALID_DURATION));
    }
    let price = (!service.pricing.custom_pricing).then_some(service.pricing.base_price);
    let mut slots = generate_slots(service_key, preference, date, &settings.slots, price);

    if let Some(date) = date {
        let windows: Vec<_> = slots
            .iter()
            .filter_map(|slot| slot_window(slot, date, settings.time_zone, minutes))
            .collect();
        if let (Some(from), Some(to)) = (
            windows.iter().map(|(start, _)| *start).min(),
            windows.iter().map(|(_, end)| *end).max(),
        ) {
            let booked = appointments.find_blocking_between(from, to).await?;
            let before = slots.len();
            slots = remove_booked(slots, date, settings.time_zone, minutes, &booked);
            debug!(
                "{} of {} suggested slots already booked on {}",
                before - slots.len(),
                before,
                date
            );
        }
    }

    Ok(SuggestedSlotsResponse {
        service_id: service_key.to_string(),
        preference,
        date: date.map(|d| d.format("%Y-%m-%d").to_string()),
        suggested_slots: slots,
    })
}

// --- Service catalog ---

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ServiceListQuery {
    pub category: Option<String>,
    /// Only active services unless `false`.
    pub active: Option<bool>,
}

pub async fn list_services<S: ServiceRepository + Sync>(
    services: &S,
    query: &ServiceListQuery,
) -> Result<Vec<Service>, BookingError> {
    let filter = ServiceFilter {
        category: query.category.clone().filter(|c| !c.trim().is_empty()),
        active_only: query.active.unwrap_or(true),
    };
    Ok(services.list(&filter).await?)
}

pub async fn get_service<S: ServiceRepository + Sync>(
    services: &S,
    key: &str,
) -> Result<Service, BookingError> {
    services
        .find_by_id_or_slug(key)
        .await?
        .ok_or_else(|| not_found(SERVICE_NOT_FOUND))
}

pub async fn create_service<S: ServiceRepository + Sync>(
    services: &S,
    service: Service,
) -> Result<Service, BookingError> {
    if service.name.trim().is_empty()
        || service.slug.trim().is_empty()
        || service.category.trim().is_empty()
    {
        return Err(validation_error(crate::builder::MISSING_FIELDS));
    }
    if let Some(minutes) = service.duration.consultation_duration {
        if !(1..=MAX_CONSULTATION_MINUTES).contains(&minutes) {
            return Err(validation_error(INVALID_DURATION));
        }
    }
    let created = services.create(service).await?;
    info!("Service {} added to the catalog", created.slug);
    Ok(created)
}
