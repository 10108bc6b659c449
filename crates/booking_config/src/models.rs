// --- File: crates/booking_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/booking.db, overridable via BOOKING_DATABASE__URL
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/booking.db".to_string(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}
fn default_acquire_timeout_secs() -> u64 {
    3
}
fn default_idle_timeout_secs() -> u64 {
    600
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
            file_prefix: default_log_file_prefix(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_file_prefix() -> String {
    "booking".to_string()
}

// --- Booking Config ---
/// Start times ("HH:MM") offered by the slot suggestion generator, per period of the day.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SlotsConfig {
    #[serde(default = "default_morning_slots")]
    pub morning: Vec<String>,
    #[serde(default = "default_afternoon_slots")]
    pub afternoon: Vec<String>,
    #[serde(default = "default_evening_slots")]
    pub evening: Vec<String>,
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: i64,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            morning: default_morning_slots(),
            afternoon: default_afternoon_slots(),
            evening: default_evening_slots(),
            duration_minutes: default_duration_minutes(),
        }
    }
}

fn default_morning_slots() -> Vec<String> {
    vec!["09:00".into(), "10:00".into(), "11:00".into()]
}
fn default_afternoon_slots() -> Vec<String> {
    vec!["14:00".into(), "15:00".into(), "16:00".into()]
}
fn default_evening_slots() -> Vec<String> {
    vec!["18:00".into(), "19:00".into(), "20:00".into()]
}
fn default_duration_minutes() -> i64 {
    60
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// Public site URL used to build self-service links in emails.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// IANA zone in which quick-form dates and suggested slots are interpreted.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_client_time_zone")]
    pub default_client_time_zone: String,
    /// Consultation length used when a service does not define one.
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: i64,
    #[serde(default = "default_meeting_base_url")]
    pub meeting_base_url: String,
    #[serde(default = "default_true")]
    pub seed_catalog: bool,
    #[serde(default)]
    pub slots: SlotsConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            time_zone: default_time_zone(),
            default_client_time_zone: default_client_time_zone(),
            default_duration_minutes: default_duration_minutes(),
            meeting_base_url: default_meeting_base_url(),
            seed_catalog: true,
            slots: SlotsConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_time_zone() -> String {
    "Africa/Abidjan".to_string()
}
fn default_client_time_zone() -> String {
    "Europe/Paris".to_string()
}
fn default_meeting_base_url() -> String {
    "https://meet.google.com".to_string()
}
fn default_true() -> bool {
    true
}

// --- Email Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    Brevo,
    Graph,
    /// Writes messages to the log only. Meant for local development.
    #[default]
    Log,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    #[serde(default)]
    pub provider: EmailProviderKind,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default = "default_sender_email")]
    pub sender_email: String,
    /// Recipient of the internal "new booking" alert. No alert is sent when unset.
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProviderKind::default(),
            sender_name: default_sender_name(),
            sender_email: default_sender_email(),
            admin_email: None,
            timeout_secs: default_email_timeout_secs(),
        }
    }
}

fn default_sender_name() -> String {
    "Leonce Ouattara Studio".to_string()
}
fn default_sender_email() -> String {
    "no-reply@localhost".to_string()
}
fn default_email_timeout_secs() -> u64 {
    10
}

// --- Brevo Config ---
// api_key is usually "secret_from_env" in the config file and resolved from BREVO_API_KEY.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    #[serde(default = "default_brevo_api_base_url")]
    pub api_base_url: String,
}

fn default_brevo_api_base_url() -> String {
    "https://api.brevo.com/v3".to_string()
}

// --- Microsoft Graph Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Delegated flow when present, client-credentials otherwise.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Overrides `https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token`.
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default = "default_graph_api_base_url")]
    pub api_base_url: String,
    /// Mailbox used for app-only calls (`/users/{mailbox}/...`).
    #[serde(default)]
    pub mailbox: Option<String>,
    #[serde(default = "default_time_zone")]
    pub calendar_time_zone: String,
    #[serde(default = "default_company_name")]
    pub company_name: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            refresh_token: None,
            scope: None,
            token_url: None,
            api_base_url: default_graph_api_base_url(),
            mailbox: None,
            calendar_time_zone: default_time_zone(),
            company_name: default_company_name(),
        }
    }
}

fn default_graph_api_base_url() -> String {
    "https://graph.microsoft.com/v1.0".to_string()
}
fn default_company_name() -> String {
    "Clients Leonce Ouattara Studio".to_string()
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_calendar: bool,
    #[serde(default)]
    pub use_contacts: bool,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub brevo: Option<BrevoConfig>,
    #[serde(default)]
    pub graph: Option<GraphConfig>,
}
