// --- File: crates/booking_appointments/src/builder.rs ---
//! Booking requests and their conversion into [`Appointment`] records.
//!
//! Two request shapes are accepted on the same endpoint:
//!
//! * the quick form from the contact page: `{ name, email, service, date, time, phone?, message? }`.
//!   Date and time are read in the business time zone. The appointment starts
//!   as `pending` and no consent is recorded as given.
//! * the detailed form from the booking wizard: `{ serviceId, client, appointment, project?, consents }`.
//!   GDPR consent is mandatory and the appointment starts as `scheduled`.

use crate::availability::{ensure_minute_aligned, window_end};
use crate::settings::BookingSettings;
use crate::tokens::{meeting_code, AppointmentTokens};
use axum::http::HeaderMap;
use booking_common::{
    validation_error, Analytics, Appointment, AppointmentStatus, AppointmentWindow, BookingError,
    ClientInfo, Consent, Consents, DeviceType, Location, LocationKind, NotificationFlags,
    ProjectContext, Service,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use uuid::Uuid;

pub const MISSING_FIELDS: &str = "Champs obligatoires manquants";
pub const INVALID_EMAIL: &str = "Format d'email invalide";
pub const MISSING_CONSENT: &str = "Données manquantes ou consentement RGPD requis";

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum BookingRequest {
    Detailed(DetailedBookingRequest),
    Quick(QuickBookingRequest),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct QuickBookingRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Alice Martin"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "alice@example.com"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Service id or slug
    #[cfg_attr(feature = "openapi", schema(example = "developpement-web"))]
    pub service: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-03-10", format = "date"))]
    pub date: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "10:00"))]
    pub time: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DetailedBookingRequest {
    pub service_id: String,
    #[serde(default)]
    pub client: Option<ClientInput>,
    #[serde(default)]
    pub appointment: Option<AppointmentInput>,
    #[serde(default)]
    pub project: Option<ProjectContext>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub consents: Option<ConsentsInput>,
    #[serde(default)]
    pub analytics: Option<AnalyticsInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInput {
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<LocationInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LocationInput {
    #[serde(rename = "type", default)]
    pub kind: LocationKind,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct ConsentsInput {
    pub gdpr: Option<ConsentInput>,
    pub marketing: Option<ConsentInput>,
    pub data_retention: Option<ConsentInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConsentInput {
    #[serde(default)]
    pub accepted: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsInput {
    pub booking_source: Option<String>,
}

/// Request facts captured for consent and analytics records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

impl RequestMetadata {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next().map(|ip| ip.trim().to_string()))
            .or_else(|| header("x-real-ip"));

        Self {
            ip_address,
            user_agent: header("user-agent"),
            referer: header("referer"),
        }
    }

    fn device_type(&self) -> DeviceType {
        match &self.user_agent {
            Some(agent) if agent.contains("Mobile") => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    }
}

/// Validated booking, before the service is known.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    /// Service id or slug as submitted.
    pub service_key: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub client_company: Option<String>,
    pub client_timezone: Option<String>,
    pub start: DateTime<Utc>,
    pub location: LocationInput,
    pub project: Option<ProjectContext>,
    pub message: Option<String>,
    pub gdpr: bool,
    pub marketing: bool,
    pub data_retention: bool,
    pub booking_source: Option<String>,
    pub status: AppointmentStatus,
}

/// Same rule as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |part: &str| !part.is_empty() && !part.chars().any(|c| c.is_whitespace() || c == '@');
    clean(local)
        && clean(domain)
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn required(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| validation_error("Format de date invalide (AAAA-MM-JJ)"))
}

fn parse_time(raw: &str) -> Result<NaiveTime, BookingError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| validation_error("Format d'heure invalide (HH:MM)"))
}

/// Local date and time in `zone`, as UTC. The earliest instant wins when the
/// local time is ambiguous; a time skipped by a DST change is rejected.
pub fn local_to_utc(zone: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, BookingError> {
    zone.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| validation_error("Cette heure n'existe pas dans le fuseau horaire du studio"))
}

impl BookingRequest {
    /// Checks required fields and formats. Nothing is read from the store.
    pub fn validate(&self, settings: &BookingSettings) -> Result<BookingDraft, BookingError> {
        match self {
            BookingRequest::Quick(quick) => quick.validate(settings),
            BookingRequest::Detailed(detailed) => detailed.validate(),
        }
    }
}

impl QuickBookingRequest {
    fn validate(&self, settings: &BookingSettings) -> Result<BookingDraft, BookingError> {
        let (Some(name), Some(email), Some(service), Some(date), Some(time)) = (
            required(&self.name),
            required(&self.email),
            required(&self.service),
            required(&self.date),
            required(&self.time),
        ) else {
            return Err(validation_error(MISSING_FIELDS));
        };
        if !is_valid_email(&email) {
            return Err(validation_error(INVALID_EMAIL));
        }

        let start = local_to_utc(settings.time_zone, parse_date(&date)?, parse_time(&time)?)?;

        Ok(BookingDraft {
            service_key: service,
            client_name: name,
            client_email: email,
            client_phone: required(&self.phone),
            client_company: None,
            client_timezone: None,
            start,
            location: LocationInput::default(),
            project: None,
            message: required(&self.message),
            gdpr: false,
            marketing: false,
            data_retention: false,
            booking_source: None,
            status: AppointmentStatus::Pending,
        })
    }
}

impl DetailedBookingRequest {
    fn validate(&self) -> Result<BookingDraft, BookingError> {
        let gdpr = self
            .consents
            .as_ref()
            .and_then(|c| c.gdpr.as_ref())
            .is_some_and(|g| g.accepted);
        let (Some(client), Some(appointment), true) = (&self.client, &self.appointment, gdpr)
        else {
            return Err(validation_error(MISSING_CONSENT));
        };
        if self.service_id.trim().is_empty()
            || client.name.trim().is_empty()
            || client.email.trim().is_empty()
        {
            return Err(validation_error(MISSING_FIELDS));
        }
        if !is_valid_email(client.email.trim()) {
            return Err(validation_error(INVALID_EMAIL));
        }

        ensure_minute_aligned(appointment.start_time)?;

        let consents = self.consents.clone().unwrap_or_default();
        let accepted = |consent: Option<&ConsentInput>| consent.is_some_and(|c| c.accepted);

        Ok(BookingDraft {
            service_key: self.service_id.trim().to_string(),
            client_name: client.name.trim().to_string(),
            client_email: client.email.trim().to_string(),
            client_phone: required(&client.phone),
            client_company: required(&client.company),
            client_timezone: required(&client.timezone),
            start: appointment.start_time,
            location: appointment.location.clone().unwrap_or_default(),
            project: self.project.clone(),
            message: required(&self.message),
            gdpr: true,
            marketing: accepted(consents.marketing.as_ref()),
            data_retention: accepted(consents.data_retention.as_ref()),
            booking_source: self
                .analytics
                .as_ref()
                .and_then(|a| required(&a.booking_source)),
            status: AppointmentStatus::Scheduled,
        })
    }
}

pub struct AppointmentBuilder<'a> {
    settings: &'a BookingSettings,
}

impl<'a> AppointmentBuilder<'a> {
    pub fn new(settings: &'a BookingSettings) -> Self {
        Self { settings }
    }

    fn consent(&self, accepted: bool, metadata: &RequestMetadata, now: DateTime<Utc>) -> Consent {
        if !accepted {
            return Consent::default();
        }
        Consent {
            accepted: true,
            accepted_at: Some(now),
            ip_address: Some(metadata.ip_address.clone().unwrap_or_else(|| "unknown".to_string())),
            user_agent: Some(metadata.user_agent.clone().unwrap_or_else(|| "unknown".to_string())),
        }
    }

    /// Assembles the record to persist. The service snapshot is frozen here.
    pub fn build(
        &self,
        draft: BookingDraft,
        service: &Service,
        metadata: &RequestMetadata,
        returning_client: bool,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        let duration = service.consultation_minutes(self.settings.default_duration_minutes);
        let start = draft.start;
        let end = window_end(start, duration)?;
        let local_start = start.with_timezone(&self.settings.time_zone);

        let location = match draft.location.kind {
            LocationKind::Online => Location {
                kind: LocationKind::Online,
                meeting_link: Some(format!("{}/{}", self.settings.meeting_base_url, meeting_code())),
                address: None,
            },
            LocationKind::InPerson => Location {
                kind: LocationKind::InPerson,
                meeting_link: None,
                address: draft.location.address.clone(),
            },
        };

        let tokens = AppointmentTokens::generate();

        Ok(Appointment {
            id: Uuid::new_v4().to_string(),
            service: service.id.clone(),
            service_snapshot: service.snapshot(),
            client: ClientInfo {
                name: draft.client_name,
                email: draft.client_email,
                phone: draft.client_phone,
                company: draft.client_company,
                timezone: draft
                    .client_timezone
                    .unwrap_or_else(|| self.settings.default_client_time_zone.clone()),
                is_returning_client: returning_client,
            },
            appointment: AppointmentWindow {
                start_time: start,
                end_time: end,
                duration,
                date: local_start.format("%Y-%m-%d").to_string(),
                time: local_start.format("%H:%M").to_string(),
                location,
            },
            project: draft.project,
            message: draft.message,
            consents: Consents {
                gdpr: self.consent(draft.gdpr, metadata, now),
                marketing: self.consent(draft.marketing, metadata, now),
                data_retention: self.consent(draft.data_retention, metadata, now),
            },
            analytics: Analytics {
                booking_source: draft
                    .booking_source
                    .or_else(|| metadata.referer.clone())
                    .unwrap_or_else(|| "direct".to_string()),
                device_type: metadata.device_type(),
                browser_info: metadata
                    .user_agent
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
                referrer_url: metadata.referer.clone(),
            },
            status: draft.status,
            confirmation_token: tokens.confirmation,
            cancellation_token: tokens.cancellation,
            notifications: NotificationFlags::default(),
            created_at: now,
            updated_at: now,
        })
    }
}
