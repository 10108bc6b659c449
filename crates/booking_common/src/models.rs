// --- File: crates/booking_common/src/models.rs ---
//! Domain records shared by the persistence, notification and HTTP layers.
//!
//! Field names serialize in camelCase, which is the shape the website and the
//! stored JSON documents use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Service catalog ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    #[default]
    Project,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default)]
    pub base_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub price_type: PriceType,
    #[serde(default)]
    pub custom_pricing: bool,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            base_price: 0.0,
            currency: default_currency(),
            price_type: PriceType::Project,
            custom_pricing: false,
        }
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ServiceDuration {
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Consultation length in minutes.
    #[serde(default)]
    pub consultation_duration: Option<i64>,
    #[serde(default)]
    pub flexible_duration: bool,
}

/// Hours before the appointment within which booking is allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AdvanceBooking {
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
}

/// Minutes kept free around an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BufferTime {
    #[serde(default)]
    pub before: i64,
    #[serde(default)]
    pub after: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub requires_consultation: bool,
    #[serde(default)]
    pub advance_booking: AdvanceBooking,
    #[serde(default)]
    pub buffer_time: BufferTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClientInfoField {
    pub field: String,
    #[serde(default)]
    pub required: bool,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    #[serde(default)]
    pub client_info: Vec<ClientInfoField>,
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub preparation_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceColor {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    #[serde(default)]
    pub total_bookings: i64,
}

/// A bookable offering of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub duration: ServiceDuration,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ServiceColor>,
    #[serde(default)]
    pub stats: ServiceStats,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Service {
    /// Consultation length in minutes, or `fallback` when the service defines none.
    pub fn consultation_minutes(&self, fallback: i64) -> i64 {
        self.duration
            .consultation_duration
            .filter(|minutes| *minutes > 0)
            .unwrap_or(fallback)
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            name: self.name.clone(),
            price: self.pricing.base_price,
            currency: self.pricing.currency.clone(),
            category: self.category.clone(),
        }
    }
}

// --- Appointments ---

/// Lifecycle of an appointment.
///
/// ```text
/// pending ──► scheduled ──► confirmed
///    │            │             │
///    └────────────┴─────────────┴──► cancelled
/// ```
/// `pending` may also go straight to `confirmed`. `cancelled` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Scheduled,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    /// Statuses that occupy their window.
    pub const BLOCKING: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Whether `self -> next` is an allowed transition. Staying put is always allowed.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Scheduled)
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Scheduled, Confirmed)
                | (Scheduled, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("Statut inconnu: {}", other)),
        }
    }
}

/// Service data copied into the appointment at booking time. Never updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceSnapshot {
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub timezone: String,
    #[serde(default)]
    pub is_returning_client: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum LocationKind {
    #[default]
    Online,
    InPerson,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: LocationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// The `[startTime, endTime)` window plus its local calendar rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AppointmentWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes.
    pub duration: i64,
    /// `YYYY-MM-DD` in the business time zone.
    pub date: String,
    /// `HH:MM` in the business time zone.
    pub time: String,
    #[serde(default)]
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Consents {
    pub gdpr: Consent,
    pub marketing: Consent,
    pub data_retention: Consent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    #[default]
    Desktop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub booking_source: String,
    pub device_type: DeviceType,
    pub browser_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NotificationFlag {
    pub sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NotificationFlags {
    pub confirmation: NotificationFlag,
    pub reminder_24h: NotificationFlag,
    pub reminder_2h: NotificationFlag,
}

/// Which notification flag to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Confirmation,
    Reminder24h,
    Reminder2h,
}

impl NotificationFlags {
    pub fn flag_mut(&mut self, channel: NotificationChannel) -> &mut NotificationFlag {
        match channel {
            NotificationChannel::Confirmation => &mut self.confirmation,
            NotificationChannel::Reminder24h => &mut self.reminder_24h,
            NotificationChannel::Reminder2h => &mut self.reminder_2h,
        }
    }
}

/// One reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(alias = "_id")]
    pub id: String,
    /// Id of the booked service.
    pub service: String,
    pub service_snapshot: ServiceSnapshot,
    pub client: ClientInfo,
    pub appointment: AppointmentWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub consents: Consents,
    pub analytics: Analytics,
    pub status: AppointmentStatus,
    pub confirmation_token: String,
    pub cancellation_token: String,
    pub notifications: NotificationFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn start(&self) -> DateTime<Utc> {
        self.appointment.start_time
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.appointment.end_time
    }
}
