// File: services/booking_backend/src/main.rs
use booking_backend::app::build_app;
use booking_common::{init_from_config, BookingError};
use booking_config::{load_config, AppConfig};
use booking_db::DbClient;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run(config: AppConfig) -> Result<(), BookingError> {
    let db = DbClient::from_config(&config.database.clone().unwrap_or_default()).await?;
    let app = build_app(&config, db.clone()).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    db.close().await;
    Ok(served?)
}

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

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server stopped: {}", e);
            ExitCode::FAILURE
        }
    }
}
