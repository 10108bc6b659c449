// File: services/booking_backend/src/bin/reset_services.rs
//! Replaces the stored service catalog with the built-in one.
//!
//! Existing appointments keep their service snapshot; their `service` id may
//! no longer resolve afterwards.

use booking_common::init_from_config;
use booking_config::load_config;
use booking_db::{reset_catalog, DbClient, ServiceRepository, SqlServiceRepository};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = init_from_config(&config.logging);

    let db = match DbClient::from_config(&config.database.clone().unwrap_or_default()).await {
        Ok(db) => db,
        Err(e) => {
            error!("Could not open the database: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let services = SqlServiceRepository::new(db.clone());

    let result = match services.init_schema().await {
        Ok(()) => reset_catalog(&services).await,
        Err(e) => Err(e),
    };
    db.close().await;

    match result {
        Ok(count) => {
            info!("Catalog reset: {} services stored", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Catalog reset failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
