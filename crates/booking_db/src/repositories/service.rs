//! Repository for the service catalog

use crate::error::DbError;
use booking_common::Service;
use std::future::Future;

/// Narrows [`ServiceRepository::list`].
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub category: Option<String>,
    /// Skip services flagged inactive.
    pub active_only: bool,
}

/// Storage for [`Service`] records.
///
/// Services are looked up either by internal id or by slug; both are unique.
pub trait ServiceRepository {
    /// Create the `services` table and its indexes if they don't exist.
    fn init_schema(&self) -> impl Future<Output = Result<(), DbError>> + Send;

    /// Services matching `filter`, ordered by `displayOrder` then slug.
    fn list(
        &self,
        filter: &ServiceFilter,
    ) -> impl Future<Output = Result<Vec<Service>, DbError>> + Send;

    fn find_by_id_or_slug(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Service>, DbError>> + Send;

    /// Store a new service, assigning its id and timestamps.
    ///
    /// Fails with [`DbError::DuplicateKey`] when the slug is taken.
    fn create(&self, service: Service) -> impl Future<Output = Result<Service, DbError>> + Send;

    fn count(&self) -> impl Future<Output = Result<i64, DbError>> + Send;

    /// Drop the whole catalog and store `services` in its place, atomically.
    fn replace_all(
        &self,
        services: Vec<Service>,
    ) -> impl Future<Output = Result<usize, DbError>> + Send;
}
