// --- File: crates/booking_notify/src/graph.rs ---
//! Microsoft Graph client: mail, calendar events and contacts.
//!
//! With a refresh token the client acts on behalf of the signed-in user
//! (`/me`). Without one it uses the client-credentials grant and addresses the
//! configured mailbox (`/users/{mailbox}`).

use crate::error::ProviderError;
use crate::provider::{
    CalendarProvider, ContactOutcome, ContactProvider, EmailMessage, EmailProvider, EmailReceipt,
};
use crate::templates::CalendarEventBody;
use askama::Template;
use async_trait::async_trait;
use booking_common::{Appointment, LocationKind, HTTP_CLIENT};
use booking_config::GraphConfig;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const DELEGATED_SCOPE: &str = "https://graph.microsoft.com/Calendars.ReadWrite https://graph.microsoft.com/Contacts.ReadWrite https://graph.microsoft.com/Mail.Send offline_access";
const APP_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<String>,
    expires_at: Option<Instant>,
    /// Latest refresh token. Microsoft rotates it on every grant.
    refresh_token: Option<String>,
}

pub struct GraphClient {
    client: Client,
    config: GraphConfig,
    token_url: String,
    api_base_url: String,
    state: Mutex<TokenState>,
}

impl GraphClient {
    pub fn new(config: &GraphConfig) -> Result<Self, ProviderError> {
        if config.tenant_id.is_empty() || config.client_id.is_empty() {
            return Err(ProviderError::ConfigError(
                "graph.tenant_id and graph.client_id are required".to_string(),
            ));
        }
        let delegated = config.refresh_token.as_deref().is_some_and(|t| !t.is_empty());
        if !delegated && config.mailbox.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::ConfigError(
                "graph.mailbox is required without a refresh token".to_string(),
            ));
        }

        let token_url = config.token_url.clone().unwrap_or_else(|| {
            format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                config.tenant_id
            )
        });

        Ok(Self {
            client: HTTP_CLIENT.clone(),
            token_url,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(TokenState {
                refresh_token: config.refresh_token.clone().filter(|t| !t.is_empty()),
                ..TokenState::default()
            }),
            config: config.clone(),
        })
    }

    fn user_path(&self) -> String {
        match self.config.refresh_token.as_deref() {
            Some(token) if !token.is_empty() => "/me".to_string(),
            _ => format!("/users/{}", self.config.mailbox.as_deref().unwrap_or_default()),
        }
    }

    /// Returns a cached access token, or requests a new one.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut state = self.state.lock().await;
        if let (Some(token), Some(expires_at)) = (&state.access_token, state.expires_at) {
            if Instant::now() + EXPIRY_MARGIN < expires_at {
                return Ok(token.clone());
            }
        }

        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let refresh_token = state.refresh_token.clone();
        match refresh_token.as_deref() {
            Some(refresh_token) => {
                form.push(("grant_type", "refresh_token"));
                form.push(("refresh_token", refresh_token));
                form.push(("scope", self.config.scope.as_deref().unwrap_or(DELEGATED_SCOPE)));
            }
            None => {
                form.push(("grant_type", "client_credentials"));
                form.push(("scope", self.config.scope.as_deref().unwrap_or(APP_SCOPE)));
            }
        }
        let body = serde_urlencoded::to_string(&form)
            .map_err(|e| ProviderError::EncodingError(e.to_string()))?;

        debug!("Requesting Microsoft Graph access token");
        let response = self
            .client
            .post(&self.token_url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Graph token request failed ({}): {}", status, error_text);
            return Err(ProviderError::AuthError(format!(
                "token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let token: TokenResponse = response.json().await?;
        state.access_token = Some(token.access_token.clone());
        state.expires_at = Some(Instant::now() + Duration::from_secs(token.expires_in));
        if let Some(rotated) = token.refresh_token {
            state.refresh_token = Some(rotated);
        }
        info!("Microsoft Graph access token refreshed");
        Ok(token.access_token)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, ProviderError> {
        let token = self.access_token().await?;
        let url = format!("{}{}{}", self.api_base_url, self.user_path(), path);
        Ok(self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    fn local_time(&self, at: DateTime<Utc>) -> (String, String) {
        let zone: Tz = self.config.calendar_time_zone.parse().unwrap_or(chrono_tz::UTC);
        (
            at.with_timezone(&zone).format("%Y-%m-%dT%H:%M:%S").to_string(),
            zone.name().to_string(),
        )
    }
}

async fn api_error(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    ProviderError::ApiError {
        provider: "microsoft-graph",
        status,
        message,
    }
}

/// "Jean Dupont Martin" -> ("Jean", "Dupont Martin").
fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let given = parts.next().unwrap_or_default().to_string();
    let surname = parts.collect::<Vec<_>>().join(" ");
    (given, surname)
}

#[async_trait]
impl EmailProvider for GraphClient {
    fn name(&self) -> &'static str {
        "microsoft-graph"
    }

    async fn send_email(&self, message: &EmailMessage) -> Result<EmailReceipt, ProviderError> {
        let body = json!({
            "message": {
                "subject": message.subject,
                "body": { "contentType": "HTML", "content": message.html },
                "toRecipients": [{
                    "emailAddress": {
                        "address": message.to_email,
                        "name": message.to_name.as_deref().unwrap_or(&message.to_email),
                    }
                }],
            },
            "saveToSentItems": true,
        });

        let response = self.post("/sendMail", &body).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        info!("Email sent via Microsoft Graph to {}", message.to_email);
        Ok(EmailReceipt {
            provider: "microsoft-graph",
            message_id: None,
        })
    }
}

#[async_trait]
impl CalendarProvider for GraphClient {
    async fn create_event(&self, appointment: &Appointment) -> Result<String, ProviderError> {
        let (start, time_zone) = self.local_time(appointment.start());
        let (end, _) = self.local_time(appointment.end());
        let online = appointment.appointment.location.kind == LocationKind::Online;

        let content = CalendarEventBody::new(appointment).render()?;

        let location = if online {
            "Microsoft Teams".to_string()
        } else {
            appointment
                .appointment
                .location
                .address
                .clone()
                .unwrap_or_default()
        };

        let body = json!({
            "subject": format!("Consultation - {}", appointment.service_snapshot.name),
            "body": { "contentType": "HTML", "content": content },
            "start": { "dateTime": start, "timeZone": time_zone },
            "end": { "dateTime": end, "timeZone": time_zone },
            "location": { "displayName": location },
            "attendees": [{
                "emailAddress": {
                    "address": appointment.client.email,
                    "name": appointment.client.name,
                },
                "type": "required",
            }],
            "isOnlineMeeting": online,
            "onlineMeetingProvider": if online { "teamsForBusiness" } else { "unknown" },
            "allowNewTimeProposals": false,
        });

        let response = self.post("/events", &body).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let created: Value = response.json().await?;
        let event_id = created
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!(
            "Calendar event {} created for appointment {}",
            event_id, appointment.id
        );
        Ok(event_id)
    }
}

#[async_trait]
impl ContactProvider for GraphClient {
    async fn upsert_contact(
        &self,
        appointment: &Appointment,
    ) -> Result<ContactOutcome, ProviderError> {
        let client = &appointment.client;
        let (given_name, surname) = split_name(&client.name);
        let company = client
            .company
            .clone()
            .unwrap_or_else(|| self.config.company_name.clone());

        let mut body = json!({
            "givenName": given_name,
            "surname": surname,
            "emailAddresses": [{ "address": client.email, "name": client.name }],
            "companyName": company,
            "jobTitle": format!("Client {}", appointment.service_snapshot.name),
            "personalNotes": format!("Premier rendez-vous : {}", appointment.appointment.date),
        });
        if let Some(phone) = &client.phone {
            body["businessPhones"] = json!([phone]);
        }

        let response = self.post("/contacts", &body).await?;
        let status = response.status();
        if status.is_success() {
            info!("Contact {} added", client.email);
            return Ok(ContactOutcome::Created);
        }

        let error = api_error(response).await;
        if let ProviderError::ApiError { message, .. } = &error {
            if status == reqwest::StatusCode::CONFLICT || message.contains("Duplicate") {
                warn!("Contact {} already exists", client.email);
                return Ok(ContactOutcome::AlreadyExists);
            }
        }
        Err(error)
    }
}
