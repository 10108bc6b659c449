use booking_common::{
    Analytics, Appointment, AppointmentStatus, AppointmentWindow, ClientInfo, Consents, Location,
    NotificationFlags, ServiceSnapshot,
};
use chrono::{TimeZone, Utc};

pub(crate) fn appointment() -> Appointment {
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    Appointment {
        id: "appt-1".to_string(),
        service: "svc-1".to_string(),
        service_snapshot: ServiceSnapshot {
            name: "Développement Web".to_string(),
            price: 2500.0,
            currency: "EUR".to_string(),
            category: "web".to_string(),
        },
        client: ClientInfo {
            name: "Awa Koné".to_string(),
            email: "awa@example.com".to_string(),
            phone: None,
            company: None,
            timezone: "Europe/Paris".to_string(),
            is_returning_client: false,
        },
        appointment: AppointmentWindow {
            start_time: start,
            end_time: start + chrono::Duration::minutes(60),
            duration: 60,
            date: "2025-03-10".to_string(),
            time: "09:00".to_string(),
            location: Location::default(),
        },
        project: None,
        message: None,
        consents: Consents::default(),
        analytics: Analytics::default(),
        status: AppointmentStatus::Pending,
        confirmation_token: "confirm-token".to_string(),
        cancellation_token: "cancel-token".to_string(),
        notifications: NotificationFlags::default(),
        created_at: start,
        updated_at: start,
    }
}
