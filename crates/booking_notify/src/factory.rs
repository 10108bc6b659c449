// --- File: crates/booking_notify/src/factory.rs ---
use crate::brevo::BrevoEmailProvider;
use crate::dispatcher::NotificationDispatcher;
use crate::error::ProviderError;
use crate::graph::GraphClient;
use crate::log_provider::LogEmailProvider;
use crate::provider::EmailProvider;
use crate::templates::EmailTemplates;
use booking_config::{AppConfig, EmailProviderKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds the dispatcher with the providers selected in `config`.
///
/// The Graph client is shared between mail, calendar and contacts when more
/// than one of them needs it.
pub fn build_dispatcher(config: &AppConfig) -> Result<NotificationDispatcher, ProviderError> {
    let wants_graph = config.email.provider == EmailProviderKind::Graph
        || config.use_calendar
        || config.use_contacts;

    let graph = match (&config.graph, wants_graph) {
        (Some(graph_config), true) => Some(Arc::new(GraphClient::new(graph_config)?)),
        (None, true) if config.email.provider == EmailProviderKind::Graph => {
            return Err(ProviderError::ConfigError(
                "email.provider is 'graph' but the graph section is missing".to_string(),
            ));
        }
        (None, true) => {
            warn!("Calendar/contact sync enabled but the graph section is missing; skipping");
            None
        }
        _ => None,
    };

    let mailer: Arc<dyn EmailProvider> = match config.email.provider {
        EmailProviderKind::Brevo => {
            let brevo = config.brevo.as_ref().ok_or_else(|| {
                ProviderError::ConfigError(
                    "email.provider is 'brevo' but the brevo section is missing".to_string(),
                )
            })?;
            Arc::new(BrevoEmailProvider::new(
                brevo,
                &config.email.sender_name,
                &config.email.sender_email,
            ))
        }
        EmailProviderKind::Graph => match &graph {
            Some(graph) => graph.clone(),
            None => {
                return Err(ProviderError::ConfigError(
                    "Microsoft Graph client unavailable".to_string(),
                ))
            }
        },
        EmailProviderKind::Log => Arc::new(LogEmailProvider),
    };

    let templates = EmailTemplates::new(
        &config.booking.base_url,
        &config.email.sender_name,
        &config.booking.time_zone,
    );

    let mut dispatcher = NotificationDispatcher::new(mailer, templates)
        .with_admin_email(config.email.admin_email.clone())
        .with_step_timeout(Duration::from_secs(config.email.timeout_secs.max(1)));

    if let Some(graph) = &graph {
        if config.use_calendar {
            dispatcher = dispatcher.with_calendar(graph.clone());
        }
        if config.use_contacts {
            dispatcher = dispatcher.with_contacts(graph.clone());
        }
    }

    info!(
        "Notification dispatcher ready (mail: {}, calendar: {}, contacts: {})",
        dispatcher.mailer_name(),
        config.use_calendar && graph.is_some(),
        config.use_contacts && graph.is_some()
    );
    Ok(dispatcher)
}
