//! Repository for the `visits` table.

use cellblock_core::lifecycle::StateMachine;
use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::VisitStatus;
use cellblock_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::stats::StatusCount;
use crate::models::visit::{CreateVisit, UpdateVisit, Visit, VisitFilter};
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, visit_code, prisoner_id, visitor_id, scheduled_at, duration_minutes, \
                        status_id, actual_start_at, actual_end_at, notes, created_at, updated_at";

const CODE_CONSTRAINT: &str = "uq_visits_visit_code";

/// Provides CRUD and status operations for visits.
///
/// Status changes are conditional on the current status being a legal
/// predecessor of the target (see [`StateMachine::predecessors`]). They
/// return `None` when the row is missing or in the wrong state; the caller
/// re-reads the row to tell the two apart.
pub struct VisitRepo;

impl VisitRepo {
    /// Insert a Scheduled visit with a generated visit code.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVisit,
    ) -> Result<Visit, unique::InsertError> {
        let query = format!(
            "INSERT INTO visits
                (visit_code, prisoner_id, visitor_id, scheduled_at, duration_minutes, status_id, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT ON CONSTRAINT {CODE_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );
        let date = input.scheduled_at.date_naive();

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let code = reference::visit_code(date);
            let row = sqlx::query_as::<_, Visit>(&query)
                .bind(&code)
                .bind(input.prisoner_id)
                .bind(input.visitor_id)
                .bind(input.scheduled_at)
                .bind(input.duration_minutes)
                .bind(VisitStatus::Scheduled.id())
                .bind(&input.notes)
                .fetch_optional(pool)
                .await?;
            match row {
                Some(visit) => return Ok(visit),
                None => unique::log_collision(CODE_CONSTRAINT, &code, attempt),
            }
        }
        Err(unique::codes_exhausted(CODE_CONSTRAINT))
    }

    /// Find a visit by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM visits WHERE id = $1");
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a visit by its code.
    pub async fn find_by_code(pool: &PgPool, visit_code: &str) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM visits WHERE visit_code = $1");
        sqlx::query_as::<_, Visit>(&query)
            .bind(visit_code)
            .fetch_optional(pool)
            .await
    }

    /// List visits matching every provided filter field, soonest first.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &VisitFilter,
    ) -> Result<Vec<Visit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visits
             WHERE ($1::BIGINT IS NULL OR prisoner_id = $1)
               AND ($2::BIGINT IS NULL OR visitor_id = $2)
               AND ($3::SMALLINT IS NULL OR status_id = $3)
               AND ($4::TIMESTAMPTZ IS NULL OR scheduled_at >= $4)
               AND ($5::TIMESTAMPTZ IS NULL OR scheduled_at < $5)
             ORDER BY scheduled_at ASC, id ASC"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(filter.prisoner_id)
            .bind(filter.visitor_id)
            .bind(filter.status_id)
            .bind(filter.scheduled_from)
            .bind(filter.scheduled_to)
            .fetch_all(pool)
            .await
    }

    /// Reschedule a visit that has not started yet.
    ///
    /// Returns `None` if the visit does not exist or is no longer Scheduled.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVisit,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "UPDATE visits SET
                scheduled_at = COALESCE($2, scheduled_at),
                duration_minutes = COALESCE($3, duration_minutes),
                notes = COALESCE($4, notes)
             WHERE id = $1 AND status_id = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .bind(input.scheduled_at)
            .bind(input.duration_minutes)
            .bind(&input.notes)
            .bind(VisitStatus::Scheduled.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move to In Progress and stamp the actual start time.
    pub async fn mark_started<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "UPDATE visits SET status_id = $2, actual_start_at = NOW()
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .bind(VisitStatus::InProgress.id())
            .bind(VisitStatus::predecessors(VisitStatus::InProgress))
            .fetch_optional(executor)
            .await
    }

    /// Move to Completed, stamp the actual end time, and append any notes.
    pub async fn mark_completed<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        notes: Option<&str>,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "UPDATE visits SET
                status_id = $2,
                actual_end_at = NOW(),
                notes = COALESCE($4, notes)
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .bind(VisitStatus::Completed.id())
            .bind(VisitStatus::predecessors(VisitStatus::Completed))
            .bind(notes)
            .fetch_optional(executor)
            .await
    }

    /// Move to Cancelled, recording the reason in the notes.
    pub async fn mark_cancelled<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        reason: Option<&str>,
    ) -> Result<Option<Visit>, sqlx::Error> {
        let query = format!(
            "UPDATE visits SET status_id = $2, notes = COALESCE($4, notes)
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visit>(&query)
            .bind(id)
            .bind(VisitStatus::Cancelled.id())
            .bind(VisitStatus::predecessors(VisitStatus::Cancelled))
            .bind(reason)
            .fetch_optional(executor)
            .await
    }

    /// Delete a visit. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM visits WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Visit counts grouped by status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM visits
             GROUP BY status_id ORDER BY status_id",
        )
        .fetch_all(pool)
        .await
    }
}
