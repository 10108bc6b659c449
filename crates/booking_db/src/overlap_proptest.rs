#[cfg(test)]
mod tests {
    use crate::test_support::{appointment, at, memory_repos};
    use crate::AppointmentRepository;
    use booking_common::{Appointment, AppointmentStatus};
    use chrono::Duration;
    use proptest::prelude::*;

    fn overlaps(a: &Appointment, b: &Appointment) -> bool {
        a.start() < b.end() && b.start() < a.end()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Whatever sequence of requests arrives, the stored blocking
        // appointments never overlap pairwise.
        #[test]
        fn test_stored_windows_never_overlap(
            requests in prop::collection::vec((0i64..48, 1i64..8, any::<bool>()), 1..25)
        ) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let (_services, repo) = memory_repos().await;

                for (quarter, length, cancel) in requests {
                    let start = at(8, 0) + Duration::minutes(quarter * 15);
                    let mut candidate =
                        appointment("svc", start, length * 15, AppointmentStatus::Pending);
                    let free = !repo
                        .has_overlap(candidate.start(), candidate.end(), None)
                        .await
                        .unwrap();
                    let inserted = repo.insert_if_available(&candidate).await.unwrap();
                    prop_assert_eq!(free, inserted);

                    if inserted && cancel {
                        candidate.status = AppointmentStatus::Cancelled;
                        repo.update(&candidate).await.unwrap();
                    }
                }

                let stored = repo.list(None).await.unwrap();
                let blocking: Vec<_> = stored.iter().filter(|a| a.status.blocks_slot()).collect();
                for (i, a) in blocking.iter().enumerate() {
                    for b in &blocking[i + 1..] {
                        prop_assert!(!overlaps(a, b), "{} overlaps {}", a.id, b.id);
                    }
                }
                Ok(())
            })?;
        }
    }
}
