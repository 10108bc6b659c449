// --- File: crates/booking_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // HTTP envelope and shared client
pub mod logging; // Logging setup
pub mod models; // Domain records

pub use error::{
    conflict, config_error, external_service_error, not_found, validation_error, BookingError,
    HttpStatusCode,
};

pub use http::{client::HTTP_CLIENT, ApiResponse, IntoHttpResponse};

pub use logging::init_from_config;

pub use models::{
    Analytics, Appointment, AppointmentStatus, AppointmentWindow, ClientInfo, Consent, Consents,
    DeviceType, Location, LocationKind, NotificationChannel, NotificationFlag, NotificationFlags,
    ProjectContext, Service, ServiceSnapshot,
};
