use booking_common::Service;
use booking_db::{DbClient, ServiceRepository, SqlAppointmentRepository, SqlServiceRepository};
use serde_json::json;

pub fn service(slug: &str, consultation_minutes: Option<i64>) -> Service {
    serde_json::from_value(json!({
        "id": format!("svc-{}", slug),
        "name": "Consultation Stratégique",
        "slug": slug,
        "category": "consulting",
        "pricing": { "basePrice": 150, "currency": "EUR", "priceType": "project" },
        "duration": { "consultationDuration": consultation_minutes },
    }))
    .unwrap()
}

/// Fresh in-memory store holding the built-in catalog.
pub async fn seeded_repos() -> (SqlServiceRepository, SqlAppointmentRepository) {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();
    let services = SqlServiceRepository::new(db.clone());
    let appointments = SqlAppointmentRepository::new(db);
    services.init_schema().await.unwrap();
    booking_db::AppointmentRepository::init_schema(&appointments)
        .await
        .unwrap();
    booking_db::seed_if_empty(&services).await.unwrap();
    (services, appointments)
}
