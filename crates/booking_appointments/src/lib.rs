// --- File: crates/booking_appointments/src/lib.rs ---
pub mod availability; // Overlap rule and slot checks
pub mod builder; // Booking requests -> Appointment
pub mod doc;
pub mod handlers;
pub mod logic;
pub mod routes;
pub mod settings;
pub mod suggestions; // Suggested slots per period
#[cfg(test)]
mod test_support;
pub mod tokens;

pub use builder::{AppointmentBuilder, BookingDraft, BookingRequest, RequestMetadata};
pub use handlers::AppointmentsState;
pub use logic::{AppointmentUpdate, CreatedAppointment, SuggestedSlotsResponse};
pub use routes::{routes, state_from_config};
pub use settings::BookingSettings;
pub use suggestions::{DayPeriod, SuggestedSlot};
