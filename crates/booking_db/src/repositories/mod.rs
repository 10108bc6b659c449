//! Repositories for the two collections of the booking platform.

pub mod appointment;
pub mod appointment_sql;
pub mod service;
pub mod service_sql;

pub use appointment::AppointmentRepository;
pub use appointment_sql::SqlAppointmentRepository;
pub use service::{ServiceFilter, ServiceRepository};
pub use service_sql::SqlServiceRepository;
