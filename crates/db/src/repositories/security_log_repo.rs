//! Repository for the `security_logs` table.

use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::{LogStatus, Severity};
use cellblock_core::types::DbId;
use sqlx::PgPool;

use crate::models::security_log::{CreateSecurityLog, SecurityLog, SecurityLogFilter};
use crate::models::stats::StatusCount;
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, log_code, employee_id, event_type, description, location, \
                        severity_id, status_id, occurred_at, created_at, updated_at";

const CODE_CONSTRAINT: &str = "uq_security_logs_log_code";

/// Provides append and query operations for the security log.
pub struct SecurityLogRepo;

impl SecurityLogRepo {
    /// Append an Open log entry with a generated log code.
    ///
    /// Severity defaults to Low and `occurred_at` to now.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSecurityLog,
    ) -> Result<SecurityLog, unique::InsertError> {
        let query = format!(
            "INSERT INTO security_logs
                (log_code, employee_id, event_type, description, location,
                 severity_id, status_id, occurred_at)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, $7), $8, COALESCE($9, NOW()))
             ON CONFLICT ON CONSTRAINT {CODE_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let code = reference::log_code();
            let row = sqlx::query_as::<_, SecurityLog>(&query)
                .bind(&code)
                .bind(input.employee_id)
                .bind(&input.event_type)
                .bind(&input.description)
                .bind(&input.location)
                .bind(input.severity_id)
                .bind(Severity::Low.id())
                .bind(LogStatus::Open.id())
                .bind(input.occurred_at)
                .fetch_optional(pool)
                .await?;
            match row {
                Some(entry) => return Ok(entry),
                None => unique::log_collision(CODE_CONSTRAINT, &code, attempt),
            }
        }
        Err(unique::codes_exhausted(CODE_CONSTRAINT))
    }

    /// Find a log entry by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SecurityLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM security_logs WHERE id = $1");
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List log entries matching every provided filter field, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &SecurityLogFilter,
    ) -> Result<Vec<SecurityLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_logs
             WHERE ($1::BIGINT IS NULL OR employee_id = $1)
               AND ($2::TEXT IS NULL OR event_type = $2)
               AND ($3::SMALLINT IS NULL OR severity_id = $3)
               AND ($4::SMALLINT IS NULL OR status_id = $4)
               AND ($5::TIMESTAMPTZ IS NULL OR occurred_at >= $5)
               AND ($6::TIMESTAMPTZ IS NULL OR occurred_at < $6)
             ORDER BY occurred_at DESC, id DESC"
        );
        sqlx::query_as::<_, SecurityLog>(&query)
            .bind(filter.employee_id)
            .bind(&filter.event_type)
            .bind(filter.severity_id)
            .bind(filter.status_id)
            .bind(filter.occurred_from)
            .bind(filter.occurred_to)
            .fetch_all(pool)
            .await
    }

    /// Close an open log entry. Returns `true` if an open entry was closed.
    pub async fn close(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE security_logs SET status_id = $2 WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(LogStatus::Closed.id())
        .bind(LogStatus::Open.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Log entry counts grouped by severity.
    pub async fn count_by_severity(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT severity_id AS status_id, COUNT(*) AS count FROM security_logs
             GROUP BY severity_id ORDER BY severity_id",
        )
        .fetch_all(pool)
        .await
    }
}
