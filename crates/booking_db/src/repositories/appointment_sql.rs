//! SQL implementation of the appointment repository

use crate::error::{is_unique_violation, DbError};
use crate::repositories::appointment::AppointmentRepository;
use crate::repositories::service_sql::SqlServiceRepository;
use crate::DbClient;
use booking_common::{Appointment, AppointmentStatus, NotificationChannel};
use chrono::{DateTime, Utc};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info, warn};

const SELECT_COLUMNS: &str = "SELECT id, status, document FROM appointments";

// Windows are stored as epoch milliseconds; `$4`/`$5` are the candidate start/end.
const INSERT_IF_FREE: &str = r#"
    INSERT INTO appointments (
        id, service_id, status, start_ts, end_ts, date, time, client_email,
        confirmation_token, cancellation_token, document, created_at, updated_at
    )
    SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
    WHERE NOT EXISTS (
        SELECT 1 FROM appointments
        WHERE status <> 'cancelled' AND start_ts < $5 AND end_ts > $4
    )
"#;

const UPDATE_SET: &str = r#"
    UPDATE appointments
    SET service_id = $2, status = $3, start_ts = $4, end_ts = $5, date = $6, time = $7,
        client_email = $8, document = $9, updated_at = $10
    WHERE id = $1
"#;

#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    db_client: DbClient,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }

    /// Run an `UPDATE_SET` statement, optionally extended with `extra_where`,
    /// binding `appointment` as `$1..$10` and `extra` afterwards.
    async fn write(
        &self,
        appointment: &Appointment,
        extra_where: &str,
        extra: Option<&str>,
    ) -> Result<bool, DbError> {
        let sql = format!("{}{}", UPDATE_SET, extra_where);
        let document = serde_json::to_string(appointment)?;

        let mut query = sqlx::query(&sql)
            .bind(appointment.id.as_str())
            .bind(appointment.service.as_str())
            .bind(appointment.status.as_str())
            .bind(appointment.start().timestamp_millis())
            .bind(appointment.end().timestamp_millis())
            .bind(appointment.appointment.date.as_str())
            .bind(appointment.appointment.time.as_str())
            .bind(appointment.client.email.as_str())
            .bind(document)
            .bind(appointment.updated_at.to_rfc3339());
        if let Some(extra) = extra {
            query = query.bind(extra);
        }

        let result = query
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update appointment {}: {}", appointment.id, e);
                DbError::QueryError(e.to_string())
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Appointment>, DbError> {
        let sql = format!("{} WHERE {} = $1", SELECT_COLUMNS, column);
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        row.as_ref().map(appointment_from_row).transpose()
    }
}

/// The `status` column is authoritative over the copy in the document.
fn appointment_from_row(row: &AnyRow) -> Result<Appointment, DbError> {
    let document: String = row.try_get("document")?;
    let mut appointment: Appointment = serde_json::from_str(&document)?;
    appointment.id = row.try_get("id")?;

    let status: String = row.try_get("status")?;
    appointment.status = status
        .parse::<AppointmentStatus>()
        .map_err(DbError::QueryError)?;
    Ok(appointment)
}

impl AppointmentRepository for SqlAppointmentRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointments schema");

        self.db_client
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS appointments (
                    id TEXT PRIMARY KEY,
                    service_id TEXT NOT NULL,
                    status TEXT NOT NULL,
                    start_ts BIGINT NOT NULL,
                    end_ts BIGINT NOT NULL,
                    date TEXT NOT NULL,
                    time TEXT NOT NULL,
                    client_email TEXT NOT NULL,
                    confirmation_token TEXT NOT NULL UNIQUE,
                    cancellation_token TEXT NOT NULL UNIQUE,
                    document TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    CHECK (end_ts > start_ts)
                )
                "#,
            )
            .await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_appointments_window ON appointments (status, start_ts, end_ts)",
            )
            .await?;

        info!("Appointments schema initialized successfully");
        Ok(())
    }

    async fn insert_if_available(&self, appointment: &Appointment) -> Result<bool, DbError> {
        debug!(
            "Inserting appointment {} for [{}, {})",
            appointment.id,
            appointment.start(),
            appointment.end()
        );
        let document = serde_json::to_string(appointment)?;

        let mut tx = self.db_client.begin().await?;
        let result = sqlx::query(INSERT_IF_FREE)
            .bind(appointment.id.as_str())
            .bind(appointment.service.as_str())
            .bind(appointment.status.as_str())
            .bind(appointment.start().timestamp_millis())
            .bind(appointment.end().timestamp_millis())
            .bind(appointment.appointment.date.as_str())
            .bind(appointment.appointment.time.as_str())
            .bind(appointment.client.email.as_str())
            .bind(appointment.confirmation_token.as_str())
            .bind(appointment.cancellation_token.as_str())
            .bind(document)
            .bind(appointment.created_at.to_rfc3339())
            .bind(appointment.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::DuplicateKey("Identifiant de rendez-vous déjà utilisé".to_string())
                } else {
                    error!("Failed to insert appointment: {}", e);
                    DbError::QueryError(e.to_string())
                }
            })?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionError(e.to_string()))?;
            warn!(
                "Window [{}, {}) already taken, appointment not inserted",
                appointment.start(),
                appointment.end()
            );
            return Ok(false);
        }

        SqlServiceRepository::increment_bookings_in(&mut tx, &appointment.service).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionError(e.to_string()))?;

        info!("Appointment {} inserted", appointment.id);
        Ok(true)
    }

    async fn has_overlap(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS n FROM appointments
            WHERE status <> 'cancelled' AND start_ts < $1 AND end_ts > $2 AND id <> $3
            "#,
        )
        .bind(end.timestamp_millis())
        .bind(start.timestamp_millis())
        .bind(exclude_id.unwrap_or(""))
        .fetch_one(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let overlapping: i64 = row.try_get("n")?;
        Ok(overlapping > 0)
    }

    async fn find_blocking_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, DbError> {
        let sql = format!(
            "{} WHERE status <> 'cancelled' AND start_ts < $1 AND end_ts > $2 ORDER BY start_ts ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(to.timestamp_millis())
            .bind(from.timestamp_millis())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(appointment_from_row).collect()
    }

    async fn list(&self, status: Option<AppointmentStatus>) -> Result<Vec<Appointment>, DbError> {
        let rows = match status {
            Some(status) => {
                let sql = format!("{} WHERE status = $1 ORDER BY start_ts ASC", SELECT_COLUMNS);
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(self.db_client.pool())
                    .await
            }
            None => {
                let sql = format!("{} ORDER BY start_ts ASC", SELECT_COLUMNS);
                sqlx::query(&sql).fetch_all(self.db_client.pool()).await
            }
        }
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        rows.iter().map(appointment_from_row).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Appointment>, DbError> {
        self.find_one("id", id).await
    }

    async fn find_by_confirmation_token(&self, token: &str) -> Result<Option<Appointment>, DbError> {
        self.find_one("confirmation_token", token).await
    }

    async fn find_by_cancellation_token(&self, token: &str) -> Result<Option<Appointment>, DbError> {
        self.find_one("cancellation_token", token).await
    }

    async fn update(&self, appointment: &Appointment) -> Result<bool, DbError> {
        self.write(appointment, "", None).await
    }

    async fn update_if_available(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> Result<bool, DbError> {
        self.write(
            appointment,
            r#"
            AND status = $11
            AND NOT EXISTS (
                SELECT 1 FROM appointments other
                WHERE other.id <> $1 AND other.status <> 'cancelled'
                  AND other.start_ts < $5 AND other.end_ts > $4
            )
            "#,
            Some(expected.as_str()),
        )
        .await
    }

    async fn replace_if_status(
        &self,
        appointment: &Appointment,
        expected: AppointmentStatus,
    ) -> Result<bool, DbError> {
        self.write(appointment, " AND status = $11", Some(expected.as_str()))
            .await
    }

    async fn mark_notification_sent(
        &self,
        id: &str,
        channel: NotificationChannel,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let Some(mut appointment) = self.find_by_id(id).await? else {
            return Ok(false);
        };

        let flag = appointment.notifications.flag_mut(channel);
        flag.sent = true;
        flag.sent_at = Some(sent_at);
        appointment.updated_at = sent_at;

        self.update(&appointment).await
    }

    async fn count_for_client(&self, email: &str) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM appointments WHERE LOWER(client_email) = LOWER($1)")
            .bind(email)
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(row.try_get("n")?)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Appointment {} deleted", id);
        }
        Ok(deleted)
    }
}
