use crate::{
    AppointmentRepository, DbClient, ServiceRepository, SqlAppointmentRepository,
    SqlServiceRepository,
};
use booking_common::models::*;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

pub async fn memory_repos() -> (SqlServiceRepository, SqlAppointmentRepository) {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();
    let services = SqlServiceRepository::new(db.clone());
    let appointments = SqlAppointmentRepository::new(db);
    services.init_schema().await.unwrap();
    appointments.init_schema().await.unwrap();
    (services, appointments)
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

pub fn appointment(
    service_id: &str,
    start: DateTime<Utc>,
    minutes: i64,
    status: AppointmentStatus,
) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4().to_string(),
        service: service_id.to_string(),
        service_snapshot: ServiceSnapshot {
            name: "Développement Web".into(),
            price: 2500.0,
            currency: "EUR".into(),
            category: "web-development".into(),
        },
        client: ClientInfo {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
            company: None,
            timezone: "Europe/Paris".into(),
            is_returning_client: false,
        },
        appointment: AppointmentWindow {
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            duration: minutes,
            date: start.format("%Y-%m-%d").to_string(),
            time: start.format("%H:%M").to_string(),
            location: Location::default(),
        },
        project: None,
        message: None,
        consents: Consents::default(),
        analytics: Analytics::default(),
        status,
        confirmation_token: Uuid::new_v4().simple().to_string(),
        cancellation_token: Uuid::new_v4().simple().to_string(),
        notifications: NotificationFlags::default(),
        created_at: now,
        updated_at: now,
    }
}
