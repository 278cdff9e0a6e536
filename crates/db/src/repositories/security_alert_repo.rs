//! Repository for the `security_alerts` table.

use cellblock_core::lifecycle::StateMachine;
use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::AlertStatus;
use cellblock_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::security_alert::{CreateSecurityAlert, SecurityAlert, SecurityAlertFilter};
use crate::models::stats::StatusCount;
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, alert_code, alert_type, severity_id, location, description, \
                        raised_by, status_id, acknowledged_by, acknowledged_at, resolved_by, \
                        resolved_at, resolution_notes, created_at, updated_at";

const CODE_CONSTRAINT: &str = "uq_security_alerts_alert_code";

/// Provides raise, lookup, and status operations for security alerts.
pub struct SecurityAlertRepo;

impl SecurityAlertRepo {
    /// Insert an Active alert with a generated alert code.
    pub async fn create(
        pool: &PgPool,
        input: &CreateSecurityAlert,
        today: Date,
    ) -> Result<SecurityAlert, unique::InsertError> {
        let query = format!(
            "INSERT INTO security_alerts
                (alert_code, alert_type, severity_id, location, description, raised_by, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT {CODE_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let code = reference::alert_code(today);
            let row = sqlx::query_as::<_, SecurityAlert>(&query)
                .bind(&code)
                .bind(&input.alert_type)
                .bind(input.severity_id)
                .bind(&input.location)
                .bind(&input.description)
                .bind(input.raised_by)
                .bind(AlertStatus::Active.id())
                .fetch_optional(pool)
                .await?;
            match row {
                Some(alert) => return Ok(alert),
                None => unique::log_collision(CODE_CONSTRAINT, &code, attempt),
            }
        }
        Err(unique::codes_exhausted(CODE_CONSTRAINT))
    }

    /// Find an alert by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SecurityAlert>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM security_alerts WHERE id = $1");
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List alerts matching every provided filter field, newest first.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &SecurityAlertFilter,
    ) -> Result<Vec<SecurityAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_alerts
             WHERE ($1::SMALLINT IS NULL OR status_id = $1)
               AND ($2::SMALLINT IS NULL OR severity_id = $2)
               AND ($3::TEXT IS NULL OR location ILIKE '%' || $3 || '%')
               AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
               AND ($5::TIMESTAMPTZ IS NULL OR created_at < $5)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(filter.status_id)
            .bind(filter.severity_id)
            .bind(&filter.location)
            .bind(filter.raised_from)
            .bind(filter.raised_to)
            .fetch_all(pool)
            .await
    }

    /// Alerts that are not yet resolved, most severe first.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<SecurityAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM security_alerts
             WHERE status_id <> $1
             ORDER BY severity_id DESC, created_at ASC"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(AlertStatus::Resolved.id())
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move to Acknowledged, recording who picked it up.
    pub async fn mark_acknowledged(
        pool: &PgPool,
        id: DbId,
        acknowledged_by: DbId,
    ) -> Result<Option<SecurityAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE security_alerts SET
                status_id = $2,
                acknowledged_by = $4,
                acknowledged_at = NOW()
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(id)
            .bind(AlertStatus::Acknowledged.id())
            .bind(AlertStatus::predecessors(AlertStatus::Acknowledged))
            .bind(acknowledged_by)
            .fetch_optional(pool)
            .await
    }

    /// Move to Resolved, recording who closed it and how.
    pub async fn mark_resolved(
        pool: &PgPool,
        id: DbId,
        resolved_by: DbId,
        resolution_notes: Option<&str>,
    ) -> Result<Option<SecurityAlert>, sqlx::Error> {
        let query = format!(
            "UPDATE security_alerts SET
                status_id = $2,
                resolved_by = $4,
                resolved_at = NOW(),
                resolution_notes = $5
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SecurityAlert>(&query)
            .bind(id)
            .bind(AlertStatus::Resolved.id())
            .bind(AlertStatus::predecessors(AlertStatus::Resolved))
            .bind(resolved_by)
            .bind(resolution_notes)
            .fetch_optional(pool)
            .await
    }

    /// Alert counts grouped by lifecycle status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM security_alerts
             GROUP BY status_id ORDER BY status_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Unresolved alert counts grouped by severity.
    pub async fn count_unresolved_by_severity(
        pool: &PgPool,
    ) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT severity_id AS status_id, COUNT(*) AS count FROM security_alerts
             WHERE status_id <> $1
             GROUP BY severity_id ORDER BY severity_id",
        )
        .bind(AlertStatus::Resolved.id())
        .fetch_all(pool)
        .await
    }
}
