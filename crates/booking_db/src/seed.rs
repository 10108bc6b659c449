//! Built-in service catalog
//!
//! The catalog ships embedded in the binary so a fresh database can be
//! populated without any external file.

use crate::error::DbError;
use crate::repositories::ServiceRepository;
use booking_common::Service;
use tracing::info;

const CATALOG_JSON: &str = include_str!("../seed/services.json");

/// The seven consulting services offered by the studio.
pub fn default_catalog() -> Result<Vec<Service>, DbError> {
    Ok(serde_json::from_str(CATALOG_JSON)?)
}

/// Populate the catalog if the `services` table is empty. Returns how many were inserted.
pub async fn seed_if_empty<R: ServiceRepository + Sync>(repo: &R) -> Result<usize, DbError> {
    if repo.count().await? > 0 {
        return Ok(0);
    }
    let inserted = repo.replace_all(default_catalog()?).await?;
    info!("Seeded empty catalog with {} services", inserted);
    Ok(inserted)
}

/// Replace whatever is stored with the built-in catalog.
pub async fn reset_catalog<R: ServiceRepository + Sync>(repo: &R) -> Result<usize, DbError> {
    repo.replace_all(default_catalog()?).await
}
