#[cfg(test)]
mod tests {
    use crate::test_support::memory_repos;
    use crate::{default_catalog, seed_if_empty, DbError, ServiceFilter, ServiceRepository};

    #[tokio::test]
    async fn test_seed_populates_catalog_once() {
        let (services, _) = memory_repos().await;

        assert_eq!(seed_if_empty(&services).await.unwrap(), 7);
        assert_eq!(seed_if_empty(&services).await.unwrap(), 0);
        assert_eq!(services.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_list_orders_by_display_order_and_filters() {
        let (services, _) = memory_repos().await;
        seed_if_empty(&services).await.unwrap();

        let all = services.list(&ServiceFilter::default()).await.unwrap();
        let slugs: Vec<_> = all.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs.first(), Some(&"developpement-web"));
        assert_eq!(slugs.last(), Some(&"consultation-strategique"));

        let consulting = services
            .list(&ServiceFilter {
                category: Some("consulting".into()),
                active_only: true,
            })
            .await
            .unwrap();
        assert_eq!(consulting.len(), 1);
        assert_eq!(consulting[0].duration.consultation_duration, Some(60));
    }

    #[tokio::test]
    async fn test_lookup_by_id_or_slug() {
        let (services, _) = memory_repos().await;
        seed_if_empty(&services).await.unwrap();

        let by_slug = services
            .find_by_id_or_slug("developpement-web")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.consultation_minutes(60), 90);
        assert_eq!(by_slug.pricing.base_price, 2500.0);

        let by_id = services
            .find_by_id_or_slug(&by_slug.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.slug, "developpement-web");

        assert!(services
            .find_by_id_or_slug("inconnu")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_rejected() {
        let (services, _) = memory_repos().await;
        let catalog = default_catalog().unwrap();

        let created = services.create(catalog[0].clone()).await.unwrap();
        assert!(!created.id.is_empty());

        let err = services.create(catalog[0].clone()).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey(_)));
    }
}
