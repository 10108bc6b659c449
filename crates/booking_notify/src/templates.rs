// --- File: crates/booking_notify/src/templates.rs ---
//! HTML and plain-text bodies of the outgoing messages.
//!
//! Bodies are askama templates under `templates/`. The `.html` ones escape
//! every interpolated value, so client input never reaches the markup raw.
//! Dates are rendered in the business time zone as `dd/mm/yyyy` and `HH:MM`.

use crate::error::ProviderError;
use crate::provider::EmailMessage;
use askama::Template;
use booking_common::{Appointment, AppointmentStatus, LocationKind};
use chrono_tz::Tz;

const ADDRESS_FALLBACK: &str = "adresse communiquée par email";

#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationHtml<'a> {
    view: &'a ConfirmationView<'a>,
}

#[derive(Template)]
#[template(path = "confirmation.txt")]
struct ConfirmationText<'a> {
    view: &'a ConfirmationView<'a>,
}

struct ConfirmationView<'a> {
    client_name: &'a str,
    service: &'a str,
    date: String,
    time: String,
    duration: i64,
    online: bool,
    meeting_link: Option<&'a str>,
    address: &'a str,
    manage_link: String,
    studio: &'a str,
}

#[derive(Template)]
#[template(path = "admin_alert.html")]
struct AdminAlertHtml<'a> {
    view: &'a AdminAlertView<'a>,
}

#[derive(Template)]
#[template(path = "admin_alert.txt")]
struct AdminAlertText<'a> {
    view: &'a AdminAlertView<'a>,
}

struct AdminAlertView<'a> {
    client_name: &'a str,
    client_email: &'a str,
    phone: Option<&'a str>,
    company: Option<&'a str>,
    service: &'a str,
    date: String,
    time: String,
    status: AppointmentStatus,
    budget: Option<&'a str>,
    description: Option<&'a str>,
    message: Option<&'a str>,
    reference: &'a str,
    manage_link: String,
}

/// Body of the calendar event created for the consultant.
#[derive(Template)]
#[template(path = "calendar_event.html")]
pub struct CalendarEventBody<'a> {
    client_name: &'a str,
    client_email: &'a str,
    phone: Option<&'a str>,
    description: Option<&'a str>,
    message: Option<&'a str>,
}

impl<'a> CalendarEventBody<'a> {
    pub fn new(appointment: &'a Appointment) -> Self {
        Self {
            client_name: &appointment.client.name,
            client_email: &appointment.client.email,
            phone: appointment.client.phone.as_deref(),
            description: appointment
                .project
                .as_ref()
                .and_then(|p| p.description.as_deref()),
            message: appointment.message.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailTemplates {
    /// Public site URL, used to build the manage link.
    pub base_url: String,
    pub studio_name: String,
    pub time_zone: Tz,
}

impl EmailTemplates {
    pub fn new(base_url: &str, studio_name: &str, time_zone: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            studio_name: studio_name.to_string(),
            time_zone: time_zone.parse().unwrap_or(chrono_tz::UTC),
        }
    }

    /// Link where the client can review or cancel the booking.
    pub fn manage_link(&self, appointment: &Appointment) -> String {
        format!(
            "{}/appointments/manage/{}",
            self.base_url, appointment.cancellation_token
        )
    }

    fn local_date_time(&self, appointment: &Appointment) -> (String, String) {
        let start = appointment.start().with_timezone(&self.time_zone);
        (
            start.format("%d/%m/%Y").to_string(),
            start.format("%H:%M").to_string(),
        )
    }

    pub fn confirmation(&self, appointment: &Appointment) -> Result<EmailMessage, ProviderError> {
        let (date, time) = self.local_date_time(appointment);
        let location = &appointment.appointment.location;
        let service = appointment.service_snapshot.name.as_str();

        let view = ConfirmationView {
            client_name: &appointment.client.name,
            service,
            date,
            time,
            duration: appointment.appointment.duration,
            online: location.kind == LocationKind::Online,
            meeting_link: match location.kind {
                LocationKind::Online => location.meeting_link.as_deref(),
                LocationKind::InPerson => None,
            },
            address: location.address.as_deref().unwrap_or(ADDRESS_FALLBACK),
            manage_link: self.manage_link(appointment),
            studio: &self.studio_name,
        };

        Ok(EmailMessage {
            to_email: appointment.client.email.clone(),
            to_name: Some(appointment.client.name.clone()),
            subject: format!("✅ Confirmation de votre rendez-vous - {}", service),
            html: ConfirmationHtml { view: &view }.render()?,
            text: ConfirmationText { view: &view }.render()?,
        })
    }

    pub fn admin_alert(
        &self,
        appointment: &Appointment,
        admin_email: &str,
    ) -> Result<EmailMessage, ProviderError> {
        let (date, time) = self.local_date_time(appointment);
        let client = &appointment.client;
        let service = appointment.service_snapshot.name.as_str();
        let project = appointment.project.as_ref();

        let view = AdminAlertView {
            client_name: &client.name,
            client_email: &client.email,
            phone: client.phone.as_deref(),
            company: client.company.as_deref(),
            service,
            date,
            time,
            status: appointment.status,
            budget: project.and_then(|p| p.budget.as_deref()),
            description: project.and_then(|p| p.description.as_deref()),
            message: appointment.message.as_deref(),
            reference: &appointment.id,
            manage_link: self.manage_link(appointment),
        };

        Ok(EmailMessage {
            to_email: admin_email.to_string(),
            to_name: None,
            subject: format!("🔔 Nouveau rendez-vous - {} ({})", client.name, service),
            html: AdminAlertHtml { view: &view }.render()?,
            text: AdminAlertText { view: &view }.render()?,
        })
    }
}
