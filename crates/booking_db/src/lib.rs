//! Persistence gateway for the booking platform
//!
//! A database-agnostic [`DbClient`] built on the `sqlx::Any` driver, plus
//! repositories for the `services` and `appointments` collections. SQLite is
//! the default backend; PostgreSQL and MySQL drivers are available through
//! feature flags.
//!
//! ```rust,no_run
//! use booking_db::{AppointmentRepository, DbClient, SqlAppointmentRepository};
//!
//! async fn open() -> Result<SqlAppointmentRepository, booking_db::DbError> {
//!     let db = DbClient::from_url("sqlite:data/booking.db").await?;
//!     let appointments = SqlAppointmentRepository::new(db);
//!     appointments.init_schema().await?;
//!     Ok(appointments)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod seed;

#[cfg(test)]
mod appointment_sql_test;
#[cfg(test)]
mod service_sql_test;
#[cfg(test)]
mod overlap_proptest;
#[cfg(test)]
mod test_support;

pub use client::{DbClient, DbTransaction};
pub use error::DbError;
pub use repositories::{
    AppointmentRepository, ServiceFilter, ServiceRepository, SqlAppointmentRepository,
    SqlServiceRepository,
};
pub use seed::{default_catalog, reset_catalog, seed_if_empty};
