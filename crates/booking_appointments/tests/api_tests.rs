use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use booking_appointments::{routes, AppointmentsState, BookingSettings};
use booking_db::{
    seed_if_empty, AppointmentRepository, DbClient, ServiceRepository, SqlAppointmentRepository,
    SqlServiceRepository,
};
use booking_notify::{log_provider::LogEmailProvider, EmailTemplates, NotificationDispatcher};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> (Router, SqlAppointmentRepository) {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();
    let services = SqlServiceRepository::new(db.clone());
    let appointments = SqlAppointmentRepository::new(db);
    services.init_schema().await.unwrap();
    appointments.init_schema().await.unwrap();
    seed_if_empty(&services).await.unwrap();

    let dispatcher = NotificationDispatcher::new(
        Arc::new(LogEmailProvider),
        EmailTemplates::new("https://studio.test", "Studio Test", "Africa/Abidjan"),
    );
    let state = Arc::new(AppointmentsState {
        settings: BookingSettings::default(),
        services,
        appointments: appointments.clone(),
        dispatcher: Arc::new(dispatcher),
    });
    (routes(state), appointments)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn alice() -> Value {
    json!({
        "name": "Alice Martin",
        "email": "alice@example.com",
        "service": "consultation-strategique",
        "date": "2025-03-10",
        "time": "10:00"
    })
}

#[tokio::test]
async fn test_booking_then_double_booking() {
    let (app, appointments) = test_app().await;
    let request = json!({
        "name": "Alice",
        "email": "alice@example.com",
        "service": "developpement-web",
        "date": "2025-03-10",
        "time": "10:00"
    });

    let (status, body) = send(&app, "POST", "/v1/appointments", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["appointment"]["status"], "pending");
    assert_eq!(body["data"]["appointment"]["appointment"]["date"], "2025-03-10");
    assert_eq!(body["data"]["appointment"]["appointment"]["time"], "10:00");
    assert_eq!(body["data"]["appointment"]["appointment"]["duration"], 90);
    assert_eq!(body["data"]["notifications"]["emailSent"], true);
    assert_eq!(body["data"]["notifications"]["calendarCreated"], false);

    let (status, body) = send(&app, "POST", "/v1/appointments", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "success": false, "error": "Ce créneau est déjà réservé" }));

    assert_eq!(appointments.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_email_writes_nothing() {
    let (app, appointments) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/appointments",
        Some(json!({
            "name": "Alice",
            "service": "consultation-strategique",
            "date": "2025-03-10",
            "time": "10:00"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Champs obligatoires manquants");
    assert!(appointments.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_detailed_form_without_consent() {
    let (app, _) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/appointments",
        Some(json!({
            "serviceId": "consultation-strategique",
            "client": { "name": "Bob", "email": "bob@example.com" },
            "appointment": { "startTime": "2025-03-11T09:00:00Z" },
            "consents": { "gdpr": { "accepted": false } }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Données manquantes ou consentement RGPD requis");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/v1/appointments")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_link_works_once() {
    let (app, _) = test_app().await;

    let (_, body) = send(&app, "POST", "/v1/appointments", Some(alice())).await;
    let token = body["data"]["appointment"]["cancellationToken"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/v1/appointments/cancel/{}", token);

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Freed window can be booked again.
    let (status, _) = send(&app, "POST", "/v1/appointments", Some(alice())).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_get_update_delete() {
    let (app, _) = test_app().await;

    let (_, body) = send(&app, "POST", "/v1/appointments", Some(alice())).await;
    let id = body["data"]["appointment"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/v1/appointments/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["client"]["email"], "alice@example.com");

    let (status, body) = send(
        &app,
        "PUT",
        "/v1/appointments",
        Some(json!({ "_id": id, "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    let (status, _) = send(&app, "GET", "/v1/appointments?status=confirmed", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/v1/appointments?status=archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "DELETE", "/v1/appointments", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID du rendez-vous requis");

    let (status, _) = send(&app, "DELETE", &format!("/v1/appointments?id={}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", &format!("/v1/appointments/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Rendez-vous non trouvé");
}

#[tokio::test]
async fn test_suggested_slots() {
    let (app, _) = test_app().await;

    let (status, body) = send(
        &app,
        "GET",
        "/v1/appointments/suggested-slots/consultation-strategique?preference=morning",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["data"]["suggestedSlots"].as_array().unwrap();
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0]["label"], "9h00 - 10h00");
    assert_eq!(slots[0]["duration"], 60);

    send(&app, "POST", "/v1/appointments", Some(alice())).await;
    let (_, body) = send(
        &app,
        "GET",
        "/v1/appointments/suggested-slots/consultation-strategique?preference=morning&date=2025-03-10",
        None,
    )
    .await;
    let starts: Vec<&str> = body["data"]["suggestedSlots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["startTime"].as_str().unwrap())
        .collect();
    assert_eq!(starts, vec!["09:00", "11:00"]);

    let (status, _) = send(
        &app,
        "GET",
        "/v1/appointments/suggested-slots/consultation-strategique?preference=night",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_service_catalog_routes() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/v1/services", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 7);

    let (status, body) = send(&app, "GET", "/v1/services/developpement-web", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["duration"]["consultationDuration"], 90);

    let (status, _) = send(&app, "GET", "/v1/services/inexistant", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/services",
        Some(json!({ "name": "Atelier IA", "slug": "atelier-ia", "category": "consulting" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/services",
        Some(json!({ "name": "Doublon", "slug": "atelier-ia", "category": "consulting" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_out_of_range_inputs_are_bad_requests() {
    let (app, appointments) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/services",
        Some(json!({
            "name": "Audit",
            "slug": "audit-long",
            "category": "consulting",
            "duration": { "consultationDuration": 1_000_000_000_000i64 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/appointments",
        Some(json!({
            "serviceId": "consultation-strategique",
            "client": { "name": "Bob", "email": "bob@example.com" },
            "appointment": { "startTime": "2025-03-11T09:00:00.900Z" },
            "consents": { "gdpr": { "accepted": true } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(appointments.list(None).await.unwrap().is_empty());
}
