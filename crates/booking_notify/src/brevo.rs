// --- File: crates/booking_notify/src/brevo.rs ---
//! Brevo transactional email (`POST /smtp/email`).

use crate::error::ProviderError;
use crate::provider::{EmailMessage, EmailProvider, EmailReceipt};
use async_trait::async_trait;
use booking_common::HTTP_CLIENT;
use booking_config::BrevoConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Serialize, Debug)]
struct BrevoContact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailRequest<'a> {
    sender: BrevoContact<'a>,
    to: Vec<BrevoContact<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailResponse {
    message_id: Option<String>,
}

pub struct BrevoEmailProvider {
    client: Client,
    api_key: String,
    api_base_url: String,
    sender_name: String,
    sender_email: String,
}

impl BrevoEmailProvider {
    pub fn new(config: &BrevoConfig, sender_name: &str, sender_email: &str) -> Self {
        Self {
            client: HTTP_CLIENT.clone(),
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            sender_name: sender_name.to_string(),
            sender_email: sender_email.to_string(),
        }
    }
}

#[async_trait]
impl EmailProvider for BrevoEmailProvider {
    fn name(&self) -> &'static str {
        "brevo"
    }

    async fn send_email(&self, message: &EmailMessage) -> Result<EmailReceipt, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::ConfigError("Brevo API key is empty".to_string()));
        }

        let url = format!("{}/smtp/email", self.api_base_url);
        let body = BrevoEmailRequest {
            sender: BrevoContact {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            to: vec![BrevoContact {
                email: &message.to_email,
                name: message.to_name.as_deref(),
            }],
            subject: &message.subject,
            html_content: &message.html,
            text_content: &message.text,
        };

        debug!("Sending email via Brevo to {}", message.to_email);
        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Brevo rejected email ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                provider: "brevo",
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: BrevoEmailResponse = response.json().await?;
        info!(
            "Email sent via Brevo to {} (messageId {:?})",
            message.to_email, parsed.message_id
        );
        Ok(EmailReceipt {
            provider: "brevo",
            message_id: parsed.message_id,
        })
    }
}
