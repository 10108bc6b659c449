//! Microsoft Graph client against a mocked token endpoint and API.

use booking_common::{
    Analytics, Appointment, AppointmentStatus, AppointmentWindow, ClientInfo, Consents, Location,
    NotificationFlags, ServiceSnapshot,
};
use booking_config::GraphConfig;
use booking_notify::graph::GraphClient;
use booking_notify::{
    CalendarProvider, ContactOutcome, ContactProvider, EmailMessage, EmailProvider,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn delegated_config(server: &MockServer) -> GraphConfig {
    GraphConfig {
        tenant_id: "tenant".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        token_url: Some(format!("{}/token", server.uri())),
        api_base_url: server.uri(),
        calendar_time_zone: "Europe/Paris".to_string(),
        ..GraphConfig::default()
    }
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 3600,
            "refresh_token": "refresh-2",
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn appointment() -> Appointment {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    Appointment {
        id: "appt-1".to_string(),
        service: "svc-1".to_string(),
        service_snapshot: ServiceSnapshot {
            name: "Cloud & DevOps".to_string(),
            price: 2000.0,
            currency: "EUR".to_string(),
            category: "cloud".to_string(),
        },
        client: ClientInfo {
            name: "Jean Dupont".to_string(),
            email: "jean@example.com".to_string(),
            phone: Some("+33 6 00 00 00 00".to_string()),
            company: None,
            timezone: "Europe/Paris".to_string(),
            is_returning_client: false,
        },
        appointment: AppointmentWindow {
            start_time: start,
            end_time: start + chrono::Duration::minutes(90),
            duration: 90,
            date: "2025-03-10".to_string(),
            time: "09:00".to_string(),
            location: Location::default(),
        },
        project: None,
        message: None,
        consents: Consents::default(),
        analytics: Analytics::default(),
        status: AppointmentStatus::Scheduled,
        confirmation_token: "c".to_string(),
        cancellation_token: "x".to_string(),
        notifications: NotificationFlags::default(),
        created_at: start,
        updated_at: start,
    }
}

#[tokio::test]
async fn test_event_is_created_in_calendar_time_zone() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_partial_json(json!({
            "subject": "Consultation - Cloud & DevOps",
            "start": { "dateTime": "2025-03-10T10:00:00", "timeZone": "Europe/Paris" },
            "end": { "dateTime": "2025-03-10T11:30:00", "timeZone": "Europe/Paris" },
            "isOnlineMeeting": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "evt-42" })))
        .mount(&server)
        .await;

    let client = GraphClient::new(&delegated_config(&server)).unwrap();
    let event_id = client.create_event(&appointment()).await.unwrap();
    assert_eq!(event_id, "evt-42");
}

#[tokio::test]
async fn test_event_body_escapes_client_input() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .and(body_string_contains("&lt;script&gt;"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "evt-7" })))
        .mount(&server)
        .await;

    let mut appointment = appointment();
    appointment.message = Some("<script>alert(1)</script>".to_string());

    let client = GraphClient::new(&delegated_config(&server)).unwrap();
    assert_eq!(client.create_event(&appointment).await.unwrap(), "evt-7");

    let requests = server.received_requests().await.unwrap();
    let event = requests
        .iter()
        .find(|request| request.url.path() == "/me/events")
        .unwrap();
    let body = String::from_utf8_lossy(&event.body);
    assert!(!body.contains("<script>"));
}

#[tokio::test]
async fn test_token_is_reused_between_calls() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/me/sendMail"))
        .respond_with(ResponseTemplate::new(202))
        .expect(2)
        .mount(&server)
        .await;

    let client = GraphClient::new(&delegated_config(&server)).unwrap();
    let message = EmailMessage {
        to_email: "jean@example.com".to_string(),
        to_name: None,
        subject: "Bonjour".to_string(),
        html: "<p>Bonjour</p>".to_string(),
        text: "Bonjour".to_string(),
    };

    client.send_email(&message).await.unwrap();
    let receipt = client.send_email(&message).await.unwrap();
    assert_eq!(receipt.provider, "microsoft-graph");
}

#[tokio::test]
async fn test_duplicate_contact_counts_as_success() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/me/contacts"))
        .and(body_partial_json(json!({
            "givenName": "Jean",
            "surname": "Dupont",
            "jobTitle": "Client Cloud & DevOps",
            "companyName": "Clients Leonce Ouattara Studio",
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "ErrorDuplicateContact", "message": "exists" }
        })))
        .mount(&server)
        .await;

    let client = GraphClient::new(&delegated_config(&server)).unwrap();
    let outcome = client.upsert_contact(&appointment()).await.unwrap();
    assert_eq!(outcome, ContactOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_rejected_token_request_fails_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let client = GraphClient::new(&delegated_config(&server)).unwrap();
    let err = client.create_event(&appointment()).await.unwrap_err();
    assert!(err.to_string().contains("invalid_grant"));
}
