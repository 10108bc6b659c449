// --- File: crates/booking_notify/src/dispatcher.rs ---
//! Post-booking side effects.
//!
//! Steps run in a fixed order. Only the client confirmation email is
//! mandatory: its failure aborts the dispatch. The calendar event, the contact
//! and the admin alert degrade independently and are reported as errors.
//! Every step is bounded by the same timeout.

use crate::error::DispatchError;
use crate::provider::{CalendarProvider, ContactOutcome, ContactProvider, EmailProvider};
use crate::templates::EmailTemplates;
use booking_common::Appointment;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStep {
    ConfirmationEmail,
    CalendarEvent,
    Contact,
    AdminEmail,
}

impl NotificationStep {
    /// Prefix of the error messages reported for this step.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationStep::ConfirmationEmail => "Email de confirmation",
            NotificationStep::CalendarEvent => "Calendrier",
            NotificationStep::Contact => "Contact",
            NotificationStep::AdminEmail => "Notification admin",
        }
    }
}

impl fmt::Display for NotificationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Succeeded,
    /// Not configured for this deployment.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub steps: Vec<(NotificationStep, StepOutcome)>,
}

impl DispatchReport {
    fn record(&mut self, step: NotificationStep, outcome: StepOutcome) {
        self.steps.push((step, outcome));
    }

    pub fn outcome(&self, step: NotificationStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|(recorded, _)| *recorded == step)
            .map(|(_, outcome)| outcome)
    }

    fn succeeded(&self, step: NotificationStep) -> bool {
        matches!(self.outcome(step), Some(StepOutcome::Succeeded))
    }

    /// `"{label}: {message}"` for every failed step, in execution order.
    pub fn errors(&self) -> Vec<String> {
        self.steps
            .iter()
            .filter_map(|(step, outcome)| match outcome {
                StepOutcome::Failed(message) => Some(format!("{}: {}", step.label(), message)),
                _ => None,
            })
            .collect()
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            email_sent: self.succeeded(NotificationStep::ConfirmationEmail),
            calendar_created: self.succeeded(NotificationStep::CalendarEvent),
            contact_added: self.succeeded(NotificationStep::Contact),
            errors: self.errors(),
        }
    }
}

/// Notification flags returned to the API caller.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub email_sent: bool,
    pub calendar_created: bool,
    pub contact_added: bool,
    pub errors: Vec<String>,
}

pub struct NotificationDispatcher {
    mailer: Arc<dyn EmailProvider>,
    calendar: Option<Arc<dyn CalendarProvider>>,
    contacts: Option<Arc<dyn ContactProvider>>,
    templates: EmailTemplates,
    admin_email: Option<String>,
    step_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn EmailProvider>, templates: EmailTemplates) -> Self {
        Self {
            mailer,
            calendar: None,
            contacts: None,
            templates,
            admin_email: None,
            step_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarProvider>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_contacts(mut self, contacts: Arc<dyn ContactProvider>) -> Self {
        self.contacts = Some(contacts);
        self
    }

    pub fn with_admin_email(mut self, admin_email: Option<String>) -> Self {
        self.admin_email = admin_email.filter(|email| !email.is_empty());
        self
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn mailer_name(&self) -> &'static str {
        self.mailer.name()
    }

    /// Runs a step under the timeout. `Err` carries the failure message.
    async fn bounded<T, E, F>(&self, step: NotificationStep, fut: F) -> Result<T, String>
    where
        E: fmt::Display,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("{} failed: {}", step, e);
                Err(e.to_string())
            }
            Err(_) => {
                warn!("{} timed out after {:?}", step, self.step_timeout);
                Err(format!(
                    "délai dépassé ({} s)",
                    self.step_timeout.as_secs()
                ))
            }
        }
    }

    pub async fn dispatch(&self, appointment: &Appointment) -> Result<DispatchReport, DispatchError> {
        debug!("Dispatching notifications for appointment {}", appointment.id);
        let mut report = DispatchReport::default();

        // Mandatory. Nothing else runs if the client is not told.
        let confirmation = self.templates.confirmation(appointment).map_err(|e| {
            error!("Confirmation email for {} could not be rendered: {}", appointment.id, e);
            DispatchError::ConfirmationEmail(e)
        })?;
        match tokio::time::timeout(self.step_timeout, self.mailer.send_email(&confirmation)).await
        {
            Ok(Ok(receipt)) => {
                info!(
                    "Confirmation email for {} sent via {}",
                    appointment.id, receipt.provider
                );
                report.record(NotificationStep::ConfirmationEmail, StepOutcome::Succeeded);
            }
            Ok(Err(e)) => {
                error!("Confirmation email for {} failed: {}", appointment.id, e);
                return Err(DispatchError::ConfirmationEmail(e));
            }
            Err(_) => {
                error!("Confirmation email for {} timed out", appointment.id);
                return Err(DispatchError::Timeout(self.step_timeout.as_secs()));
            }
        }

        let outcome = match &self.calendar {
            Some(calendar) => match self
                .bounded(NotificationStep::CalendarEvent, calendar.create_event(appointment))
                .await
            {
                Ok(_) => StepOutcome::Succeeded,
                Err(message) => StepOutcome::Failed(message),
            },
            None => StepOutcome::Skipped("calendrier désactivé".to_string()),
        };
        report.record(NotificationStep::CalendarEvent, outcome);

        let outcome = match &self.contacts {
            Some(contacts) => match self
                .bounded(NotificationStep::Contact, contacts.upsert_contact(appointment))
                .await
            {
                Ok(ContactOutcome::Created) | Ok(ContactOutcome::AlreadyExists) => {
                    StepOutcome::Succeeded
                }
                Err(message) => StepOutcome::Failed(message),
            },
            None => StepOutcome::Skipped("contacts désactivés".to_string()),
        };
        report.record(NotificationStep::Contact, outcome);

        let outcome = match &self.admin_email {
            Some(admin_email) => match self.templates.admin_alert(appointment, admin_email) {
                Ok(alert) => match self
                    .bounded(NotificationStep::AdminEmail, self.mailer.send_email(&alert))
                    .await
                {
                    Ok(_) => StepOutcome::Succeeded,
                    Err(message) => StepOutcome::Failed(message),
                },
                Err(e) => {
                    warn!("{} could not be rendered: {}", NotificationStep::AdminEmail, e);
                    StepOutcome::Failed(e.to_string())
                }
            },
            None => StepOutcome::Skipped("aucune adresse admin".to_string()),
        };
        report.record(NotificationStep::AdminEmail, outcome);

        let errors = report.errors();
        if errors.is_empty() {
            info!("Notifications for {} dispatched", appointment.id);
        } else {
            warn!(
                "Notifications for {} dispatched with {} error(s): {:?}",
                appointment.id,
                errors.len(),
                errors
            );
        }
        Ok(report)
    }
}
