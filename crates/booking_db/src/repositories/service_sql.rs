//! SQL implementation of the service repository
//!
//! Each row keeps the full JSON document next to the columns used for
//! filtering. `is_active` and `total_bookings` live in their own columns and
//! take precedence over the copies inside the document.

use crate::client::DbTransaction;
use crate::error::{is_unique_violation, DbError};
use crate::repositories::service::{ServiceFilter, ServiceRepository};
use crate::DbClient;
use booking_common::Service;
use chrono::Utc;
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, is_active, total_bookings, document FROM services";

const INSERT_SERVICE: &str = r#"
    INSERT INTO services (id, slug, category, display_order, is_active, total_bookings, document, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

#[derive(Debug, Clone)]
pub struct SqlServiceRepository {
    db_client: DbClient,
}

impl SqlServiceRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Bump the booking counter of `service_id` inside an open transaction.
    pub(crate) async fn increment_bookings_in(
        tx: &mut DbTransaction<'_>,
        service_id: &str,
    ) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE services SET total_bookings = total_bookings + 1, updated_at = $1 WHERE id = $2",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(service_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            error!("Failed to increment booking counter: {}", e);
            DbError::QueryError(e.to_string())
        })?;
        Ok(())
    }

    async fn insert_in(tx: &mut DbTransaction<'_>, service: &Service) -> Result<(), DbError> {
        let document = serde_json::to_string(service)?;
        sqlx::query(INSERT_SERVICE)
            .bind(service.id.as_str())
            .bind(service.slug.as_str())
            .bind(service.category.as_str())
            .bind(service.display_order)
            .bind(i64::from(service.is_active))
            .bind(service.stats.total_bookings)
            .bind(document)
            .bind(service.created_at.to_rfc3339())
            .bind(service.updated_at.to_rfc3339())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateKey(format!(
                        "Un service avec le slug '{}' existe déjà",
                        service.slug
                    ))
                } else {
                    error!("Failed to insert service {}: {}", service.slug, e);
                    DbError::QueryError(e.to_string())
                }
            })?;
        Ok(())
    }
}

fn service_from_row(row: &AnyRow) -> Result<Service, DbError> {
    let document: String = row.try_get("document")?;
    let mut service: Service = serde_json::from_str(&document)?;
    service.id = row.try_get("id")?;
    service.is_active = row.try_get::<i64, _>("is_active")? != 0;
    service.stats.total_bookings = row.try_get("total_bookings")?;
    Ok(service)
}

fn prepare_new(mut service: Service) -> Service {
    if service.id.is_empty() {
        service.id = Uuid::new_v4().to_string();
    }
    let now = Utc::now();
    service.created_at = now;
    service.updated_at = now;
    service
}

impl ServiceRepository for SqlServiceRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing services schema");

        self.db_client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS services (
                    id TEXT PRIMARY KEY,
                    slug TEXT NOT NULL UNIQUE,
                    category TEXT NOT NULL,
                    display_order INTEGER NOT NULL DEFAULT 0,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    total_bookings INTEGER NOT NULL DEFAULT 0,
                    document TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#,
            )
            .await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_services_display_order ON services (display_order)",
            )
            .await?;

        info!("Services schema initialized successfully");
        Ok(())
    }

    async fn list(&self, filter: &ServiceFilter) -> Result<Vec<Service>, DbError> {
        let mut sql = format!("{} WHERE 1 = 1", SELECT_COLUMNS);
        if filter.active_only {
            sql.push_str(" AND is_active = 1");
        }
        if filter.category.is_some() {
            sql.push_str(" AND category = $1");
        }
        sql.push_str(" ORDER BY display_order ASC, slug ASC");

        let mut query = sqlx::query(&sql);
        if let Some(category) = filter.category.as_deref() {
            query = query.bind(category);
        }

        let rows = query
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(service_from_row).collect()
    }

    async fn find_by_id_or_slug(&self, key: &str) -> Result<Option<Service>, DbError> {
        let sql = format!("{} WHERE id = $1 OR slug = $1", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.as_ref().map(service_from_row).transpose()
    }

    async fn create(&self, service: Service) -> Result<Service, DbError> {
        debug!("Creating service: {}", service.slug);

        if self.find_by_id_or_slug(&service.slug).await?.is_some() {
            return Err(DbError::DuplicateKey(format!(
                "Un service avec le slug '{}' existe déjà",
                service.slug
            )));
        }

        let service = prepare_new(service);
        let mut tx = self.db_client.begin().await?;
        Self::insert_in(&mut tx, &service).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Service {} created with id {}", service.slug, service.id);
        Ok(service)
    }

    async fn count(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM services")
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(row.try_get("n")?)
    }

    async fn replace_all(&self, services: Vec<Service>) -> Result<usize, DbError> {
        let mut tx = self.db_client.begin().await?;
        sqlx::query("DELETE FROM services")
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let total = services.len();
        for service in services {
            let service = prepare_new(service);
            Self::insert_in(&mut tx, &service).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;
        info!("Service catalog replaced with {} services", total);
        Ok(total)
    }
}
