#[cfg(test)]
mod tests {
    use crate::test_support::{appointment, at, memory_repos};
    use crate::{default_catalog, AppointmentRepository, ServiceRepository};
    use booking_common::{AppointmentStatus, NotificationChannel};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_identical_window_is_rejected() {
        let (_, appointments) = memory_repos().await;

        let first = appointment("svc", at(10, 0), 60, AppointmentStatus::Pending);
        assert!(appointments.insert_if_available(&first).await.unwrap());

        let second = appointment("svc", at(10, 0), 60, AppointmentStatus::Pending);
        assert!(!appointments.insert_if_available(&second).await.unwrap());

        let stored = appointments.list(None).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, first.id);
    }

    #[tokio::test]
    async fn test_partial_overlap_is_rejected() {
        let (_, appointments) = memory_repos().await;

        let booked = appointment("svc", at(10, 0), 90, AppointmentStatus::Scheduled);
        assert!(appointments.insert_if_available(&booked).await.unwrap());

        let overlapping = appointment("other", at(11, 0), 60, AppointmentStatus::Pending);
        assert!(!appointments.insert_if_available(&overlapping).await.unwrap());

        let enclosing = appointment("other", at(9, 0), 180, AppointmentStatus::Pending);
        assert!(!appointments.insert_if_available(&enclosing).await.unwrap());
    }

    #[tokio::test]
    async fn test_touching_windows_are_allowed() {
        let (_, appointments) = memory_repos().await;

        let morning = appointment("svc", at(9, 0), 60, AppointmentStatus::Confirmed);
        let next = appointment("svc", at(10, 0), 60, AppointmentStatus::Pending);
        let before = appointment("svc", at(8, 0), 60, AppointmentStatus::Pending);

        assert!(appointments.insert_if_available(&morning).await.unwrap());
        assert!(appointments.insert_if_available(&next).await.unwrap());
        assert!(appointments.insert_if_available(&before).await.unwrap());
        assert_eq!(appointments.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_appointment_frees_its_window() {
        let (_, appointments) = memory_repos().await;

        let mut booked = appointment("svc", at(14, 0), 60, AppointmentStatus::Pending);
        assert!(appointments.insert_if_available(&booked).await.unwrap());
        assert!(appointments
            .has_overlap(at(14, 0), at(15, 0), None)
            .await
            .unwrap());

        booked.status = AppointmentStatus::Cancelled;
        assert!(appointments.update(&booked).await.unwrap());
        assert!(!appointments
            .has_overlap(at(14, 0), at(15, 0), None)
            .await
            .unwrap());

        let rebooked = appointment("svc", at(14, 0), 60, AppointmentStatus::Pending);
        assert!(appointments.insert_if_available(&rebooked).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_overlap_ignores_excluded_id() {
        let (_, appointments) = memory_repos().await;

        let booked = appointment("svc", at(10, 0), 60, AppointmentStatus::Scheduled);
        appointments.insert_if_available(&booked).await.unwrap();

        assert!(appointments
            .has_overlap(at(10, 30), at(11, 30), None)
            .await
            .unwrap());
        assert!(!appointments
            .has_overlap(at(10, 30), at(11, 30), Some(&booked.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_insert_increments_service_counter() {
        let (services, appointments) = memory_repos().await;
        services.replace_all(default_catalog().unwrap()).await.unwrap();
        let service = services
            .find_by_id_or_slug("developpement-web")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(service.stats.total_bookings, 0);

        let booked = appointment(&service.id, at(10, 0), 90, AppointmentStatus::Pending);
        appointments.insert_if_available(&booked).await.unwrap();
        let rejected = appointment(&service.id, at(10, 0), 90, AppointmentStatus::Pending);
        appointments.insert_if_available(&rejected).await.unwrap();

        let service = services
            .find_by_id_or_slug(&service.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(service.stats.total_bookings, 1);
    }

    #[tokio::test]
    async fn test_replace_if_status_succeeds_only_once() {
        let (_, appointments) = memory_repos().await;

        let booked = appointment("svc", at(16, 0), 60, AppointmentStatus::Pending);
        appointments.insert_if_available(&booked).await.unwrap();

        let mut cancelled = booked.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        assert!(appointments
            .replace_if_status(&cancelled, AppointmentStatus::Pending)
            .await
            .unwrap());
        assert!(!appointments
            .replace_if_status(&cancelled, AppointmentStatus::Pending)
            .await
            .unwrap());

        let stored = appointments
            .find_by_cancellation_token(&booked.cancellation_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_if_available_refuses_occupied_window() {
        let (_, appointments) = memory_repos().await;

        let nine = appointment("svc", at(9, 0), 60, AppointmentStatus::Scheduled);
        let eleven = appointment("svc", at(11, 0), 60, AppointmentStatus::Scheduled);
        appointments.insert_if_available(&nine).await.unwrap();
        appointments.insert_if_available(&eleven).await.unwrap();

        let mut moved = eleven.clone();
        moved.appointment.start_time = at(9, 30);
        moved.appointment.end_time = at(10, 30);
        assert!(!appointments
            .update_if_available(&moved, AppointmentStatus::Scheduled)
            .await
            .unwrap());

        // Moving within its own window only overlaps itself.
        moved.appointment.start_time = at(11, 30);
        moved.appointment.end_time = at(12, 30);
        assert!(appointments
            .update_if_available(&moved, AppointmentStatus::Scheduled)
            .await
            .unwrap());

        let stored = appointments.find_by_id(&eleven.id).await.unwrap().unwrap();
        assert_eq!(stored.start(), at(11, 30));
    }

    #[tokio::test]
    async fn test_move_does_not_undo_a_cancellation() {
        let (_, appointments) = memory_repos().await;

        let booked = appointment("svc", at(9, 0), 60, AppointmentStatus::Scheduled);
        appointments.insert_if_available(&booked).await.unwrap();

        // Read by the admin, then cancelled by the client before the move lands.
        let mut moved = booked.clone();
        let mut cancelled = booked.clone();
        cancelled.status = AppointmentStatus::Cancelled;
        assert!(appointments
            .replace_if_status(&cancelled, AppointmentStatus::Scheduled)
            .await
            .unwrap());

        moved.appointment.start_time = at(15, 0);
        moved.appointment.end_time = at(16, 0);
        assert!(!appointments
            .update_if_available(&moved, AppointmentStatus::Scheduled)
            .await
            .unwrap());

        let stored = appointments.find_by_id(&booked.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);
        assert_eq!(stored.start(), at(9, 0));
    }

    #[tokio::test]
    async fn test_sub_second_overlap_is_rejected() {
        let (_, appointments) = memory_repos().await;

        let first_start = at(10, 0) + Duration::milliseconds(900);
        let first = appointment("svc", first_start, 60, AppointmentStatus::Pending);
        assert!(appointments.insert_if_available(&first).await.unwrap());

        // Opens 400 ms before the first one closes.
        let second_start = at(11, 0) + Duration::milliseconds(500);
        let second = appointment("svc", second_start, 60, AppointmentStatus::Pending);
        assert!(!appointments.insert_if_available(&second).await.unwrap());
        assert!(appointments
            .has_overlap(second.start(), second.end(), None)
            .await
            .unwrap());

        let touching = appointment("svc", first.end(), 60, AppointmentStatus::Pending);
        assert!(appointments.insert_if_available(&touching).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_notification_sent_persists_flag() {
        let (_, appointments) = memory_repos().await;
        let booked = appointment("svc", at(10, 0), 60, AppointmentStatus::Pending);
        appointments.insert_if_available(&booked).await.unwrap();

        let sent_at = Utc::now();
        assert!(appointments
            .mark_notification_sent(&booked.id, NotificationChannel::Confirmation, sent_at)
            .await
            .unwrap());
        assert!(!appointments
            .mark_notification_sent("missing", NotificationChannel::Confirmation, sent_at)
            .await
            .unwrap());

        let stored = appointments.find_by_id(&booked.id).await.unwrap().unwrap();
        assert!(stored.notifications.confirmation.sent);
        assert!(stored.notifications.confirmation.sent_at.is_some());
        assert!(!stored.notifications.reminder_24h.sent);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_delete_removes() {
        let (_, appointments) = memory_repos().await;
        let pending = appointment("svc", at(9, 0), 60, AppointmentStatus::Pending);
        let confirmed = appointment("svc", at(13, 0), 60, AppointmentStatus::Confirmed);
        appointments.insert_if_available(&pending).await.unwrap();
        appointments.insert_if_available(&confirmed).await.unwrap();

        let only_confirmed = appointments
            .list(Some(AppointmentStatus::Confirmed))
            .await
            .unwrap();
        assert_eq!(only_confirmed.len(), 1);
        assert_eq!(only_confirmed[0].id, confirmed.id);

        assert!(appointments.delete(&pending.id).await.unwrap());
        assert!(!appointments.delete(&pending.id).await.unwrap());
        assert!(appointments.find_by_id(&pending.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_blocking_between_skips_cancelled() {
        let (_, appointments) = memory_repos().await;
        let kept = appointment("svc", at(9, 0), 60, AppointmentStatus::Pending);
        let mut dropped = appointment("svc", at(15, 0), 60, AppointmentStatus::Pending);
        appointments.insert_if_available(&kept).await.unwrap();
        appointments.insert_if_available(&dropped).await.unwrap();
        dropped.status = AppointmentStatus::Cancelled;
        appointments.update(&dropped).await.unwrap();

        let day_start = at(0, 0);
        let blocking = appointments
            .find_blocking_between(day_start, day_start + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_count_for_client_ignores_case() {
        let (_, appointments) = memory_repos().await;
        assert_eq!(appointments.count_for_client("alice@example.com").await.unwrap(), 0);

        let first = appointment("svc", at(9, 0), 60, AppointmentStatus::Pending);
        appointments.insert_if_available(&first).await.unwrap();

        assert_eq!(appointments.count_for_client("Alice@Example.com").await.unwrap(), 1);
        assert_eq!(appointments.count_for_client("bob@example.com").await.unwrap(), 0);
    }
}
