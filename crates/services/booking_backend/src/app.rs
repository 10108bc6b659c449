// --- File: crates/services/booking_backend/src/app.rs ---
//! Wires the database, the notification providers and the booking routes
//! into one router mounted under `/api`.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use booking_appointments::{routes as booking_routes, state_from_config};
use booking_common::BookingError;
use booking_config::AppConfig;
use booking_db::{
    seed_if_empty, AppointmentRepository, DbClient, ServiceRepository, SqlAppointmentRepository,
    SqlServiceRepository,
};
use booking_notify::{build_dispatcher, NotificationDispatcher};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Creates the tables and, when configured, seeds an empty catalog.
pub async fn prepare_database(config: &AppConfig, db: &DbClient) -> Result<(), BookingError> {
    let services = SqlServiceRepository::new(db.clone());
    services.init_schema().await?;
    SqlAppointmentRepository::new(db.clone()).init_schema().await?;

    if config.booking.seed_catalog {
        let inserted = seed_if_empty(&services).await?;
        if inserted > 0 {
            info!("Catalog seeded with {} services", inserted);
        }
    }
    Ok(())
}

async fn health_handler(State(db): State<DbClient>) -> (StatusCode, Json<Value>) {
    if db.is_healthy().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": "up" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
    }
}

/// The full application router. The schema must already exist.
pub fn build_router(
    config: &AppConfig,
    db: DbClient,
    dispatcher: NotificationDispatcher,
) -> Result<Router, BookingError> {
    info!("Confirmation emails go through the {} provider", dispatcher.mailer_name());
    let state = state_from_config(config, db.clone(), Arc::new(dispatcher))?;

    let api_router = Router::new()
        .route("/", get(|| async { "Leonce Ouattara Studio booking API" }))
        .route("/health", get(health_handler))
        .with_state(db)
        .merge(booking_routes(state));

    #[allow(unused_mut)] // only reassigned with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use booking_appointments::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Booking API",
                version = "0.1.0",
                description = "Appointments and service catalog of the consulting studio",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Swagger UI available at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    Ok(app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}

/// Prepares the database, builds the providers from config and returns the router.
pub async fn build_app(config: &AppConfig, db: DbClient) -> Result<Router, BookingError> {
    prepare_database(config, &db).await?;
    let dispatcher = build_dispatcher(config)?;
    build_router(config, db, dispatcher)
}
