//! Repository for the `tasks` table.

use cellblock_core::lifecycle::StateMachine;
use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::{TaskPriority, TaskStatus};
use cellblock_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::stats::StatusCount;
use crate::models::task::{CreateTask, Task, TaskFilter, UpdateTask};
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_code, title, description, assigned_to, assigned_by, \
                        priority_id, status_id, due_date, started_at, completed_by, \
                        completed_at, completion_notes, created_at, updated_at";

const CODE_CONSTRAINT: &str = "uq_tasks_task_code";

/// Provides CRUD and status operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a Pending task with a generated task code. Priority defaults
    /// to Medium.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTask,
        today: Date,
    ) -> Result<Task, unique::InsertError> {
        let query = format!(
            "INSERT INTO tasks
                (task_code, title, description, assigned_to, assigned_by,
                 priority_id, status_id, due_date)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, $7), $8, $9)
             ON CONFLICT ON CONSTRAINT {CODE_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let code = reference::task_code(today);
            let row = sqlx::query_as::<_, Task>(&query)
                .bind(&code)
                .bind(&input.title)
                .bind(&input.description)
                .bind(input.assigned_to)
                .bind(input.assigned_by)
                .bind(input.priority_id)
                .bind(TaskPriority::Medium.id())
                .bind(TaskStatus::Pending.id())
                .bind(input.due_date)
                .fetch_optional(pool)
                .await?;
            match row {
                Some(task) => return Ok(task),
                None => unique::log_collision(CODE_CONSTRAINT, &code, attempt),
            }
        }
        Err(unique::codes_exhausted(CODE_CONSTRAINT))
    }

    /// Find a task by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List tasks matching every provided filter field.
    ///
    /// Ordered by priority (most urgent first), then due date.
    pub async fn list_filtered(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE ($1::BIGINT IS NULL OR assigned_to = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
               AND ($3::SMALLINT IS NULL OR priority_id = $3)
               AND ($4::DATE IS NULL OR (due_date < $4 AND status_id <> $5))
             ORDER BY priority_id DESC, due_date ASC NULLS LAST, id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(filter.assigned_to)
            .bind(filter.status_id)
            .bind(filter.priority_id)
            .bind(filter.overdue_as_of)
            .bind(TaskStatus::Completed.id())
            .fetch_all(pool)
            .await
    }

    /// Update a task. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                assigned_to = COALESCE($4, assigned_to),
                priority_id = COALESCE($5, priority_id),
                due_date = COALESCE($6, due_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.assigned_to)
            .bind(input.priority_id)
            .bind(input.due_date)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Move to In Progress and stamp the start time.
    pub async fn mark_started(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET status_id = $2, started_at = NOW()
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(TaskStatus::InProgress.id())
            .bind(TaskStatus::predecessors(TaskStatus::InProgress))
            .fetch_optional(pool)
            .await
    }

    /// Move to Completed, recording who closed it and any notes.
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
        completed_by: DbId,
        notes: Option<&str>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                status_id = $2,
                completed_by = $4,
                completed_at = NOW(),
                completion_notes = $5
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(TaskStatus::Completed.id())
            .bind(TaskStatus::predecessors(TaskStatus::Completed))
            .bind(completed_by)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    /// Delete a task. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Task counts grouped by status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM tasks
             GROUP BY status_id ORDER BY status_id",
        )
        .fetch_all(pool)
        .await
    }
}
