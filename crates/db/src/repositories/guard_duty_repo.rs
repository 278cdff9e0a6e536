//! Repository for the `guard_duties` and `guard_duty_reports` tables.

use cellblock_core::lifecycle::StateMachine;
use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::DutyStatus;
use cellblock_core::types::DbId;
use sqlx::PgPool;

use crate::models::guard_duty::{
    CreateGuardDuty, GuardDuty, GuardDutyFilter, GuardDutyReport, UpdateGuardDuty,
};
use crate::models::stats::StatusCount;
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, duty_code, employee_id, post, shift_start, shift_end, status_id, \
                        started_at, completed_at, notes, created_at, updated_at";

const REPORT_COLUMNS: &str = "id, guard_duty_id, reported_by, description, created_at, updated_at";

const CODE_CONSTRAINT: &str = "uq_guard_duties_duty_code";

/// Provides CRUD and status operations for guard duties.
pub struct GuardDutyRepo;

impl GuardDutyRepo {
    /// Insert a Scheduled duty with a generated duty code.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGuardDuty,
    ) -> Result<GuardDuty, unique::InsertError> {
        let query = format!(
            "INSERT INTO guard_duties
                (duty_code, employee_id, post, shift_start, shift_end, status_id, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT {CODE_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );
        let date = input.shift_start.date_naive();

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let code = reference::duty_code(date);
            let row = sqlx::query_as::<_, GuardDuty>(&query)
                .bind(&code)
                .bind(input.employee_id)
                .bind(&input.post)
                .bind(input.shift_start)
                .bind(input.shift_end)
                .bind(DutyStatus::Scheduled.id())
                .bind(&input.notes)
                .fetch_optional(pool)
                .await?;
            match row {
                Some(duty) => return Ok(duty),
                None => unique::log_collision(CODE_CONSTRAINT, &code, attempt),
            }
        }
        Err(unique::codes_exhausted(CODE_CONSTRAINT))
    }

    /// Find a duty by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GuardDuty>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM guard_duties WHERE id = $1");
        sqlx::query_as::<_, GuardDuty>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List duties matching every provided filter field.
    ///
    /// The window filter matches shifts that overlap `[window_start, window_end)`.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &GuardDutyFilter,
    ) -> Result<Vec<GuardDuty>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM guard_duties
             WHERE ($1::BIGINT IS NULL OR employee_id = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
               AND ($3::TEXT IS NULL OR post = $3)
               AND ($4::TIMESTAMPTZ IS NULL OR shift_end > $4)
               AND ($5::TIMESTAMPTZ IS NULL OR shift_start < $5)
             ORDER BY shift_start ASC, id ASC"
        );
        sqlx::query_as::<_, GuardDuty>(&query)
            .bind(filter.employee_id)
            .bind(filter.status_id)
            .bind(&filter.post)
            .bind(filter.window_start)
            .bind(filter.window_end)
            .fetch_all(pool)
            .await
    }

    /// Update a duty that has not started yet.
    ///
    /// Returns `None` if the duty does not exist or is no longer Scheduled.
    /// A shift window ending before it starts fails on `ck_guard_duties_shift`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateGuardDuty,
    ) -> Result<Option<GuardDuty>, sqlx::Error> {
        let query = format!(
            "UPDATE guard_duties SET
                employee_id = COALESCE($2, employee_id),
                post = COALESCE($3, post),
                shift_start = COALESCE($4, shift_start),
                shift_end = COALESCE($5, shift_end),
                notes = COALESCE($6, notes)
             WHERE id = $1 AND status_id = $7
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GuardDuty>(&query)
            .bind(id)
            .bind(input.employee_id)
            .bind(&input.post)
            .bind(input.shift_start)
            .bind(input.shift_end)
            .bind(&input.notes)
            .bind(DutyStatus::Scheduled.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move to In Progress and stamp the start time.
    pub async fn mark_started(pool: &PgPool, id: DbId) -> Result<Option<GuardDuty>, sqlx::Error> {
        let query = format!(
            "UPDATE guard_duties SET status_id = $2, started_at = NOW()
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GuardDuty>(&query)
            .bind(id)
            .bind(DutyStatus::InProgress.id())
            .bind(DutyStatus::predecessors(DutyStatus::InProgress))
            .fetch_optional(pool)
            .await
    }

    /// Move to Completed and stamp the end time.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<Option<GuardDuty>, sqlx::Error> {
        let query = format!(
            "UPDATE guard_duties SET
                status_id = $2,
                completed_at = NOW(),
                notes = COALESCE($4, notes)
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GuardDuty>(&query)
            .bind(id)
            .bind(DutyStatus::Completed.id())
            .bind(DutyStatus::predecessors(DutyStatus::Completed))
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Delete a duty. Its reports cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM guard_duties WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Duty counts grouped by status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM guard_duties
             GROUP BY status_id ORDER BY status_id",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// File an issue report against a duty.
    pub async fn add_report(
        pool: &PgPool,
        guard_duty_id: DbId,
        reported_by: Option<DbId>,
        description: &str,
    ) -> Result<GuardDutyReport, sqlx::Error> {
        let query = format!(
            "INSERT INTO guard_duty_reports (guard_duty_id, reported_by, description)
             VALUES ($1, $2, $3)
             RETURNING {REPORT_COLUMNS}"
        );
        sqlx::query_as::<_, GuardDutyReport>(&query)
            .bind(guard_duty_id)
            .bind(reported_by)
            .bind(description)
            .fetch_one(pool)
            .await
    }

    /// Reports filed against a duty, oldest first.
    pub async fn list_reports(
        pool: &PgPool,
        guard_duty_id: DbId,
    ) -> Result<Vec<GuardDutyReport>, sqlx::Error> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM guard_duty_reports
             WHERE guard_duty_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, GuardDutyReport>(&query)
            .bind(guard_duty_id)
            .fetch_all(pool)
            .await
    }
}
