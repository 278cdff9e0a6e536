//! Task entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub task_code: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub assigned_by: Option<DbId>,
    pub priority_id: StatusId,
    pub status_id: StatusId,
    pub due_date: Option<Date>,
    pub started_at: Option<Timestamp>,
    pub completed_by: Option<DbId>,
    pub completed_at: Option<Timestamp>,
    pub completion_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for assigning a new task. The task code is generated on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub assigned_by: Option<DbId>,
    pub priority_id: Option<StatusId>,
    pub due_date: Option<Date>,
}

/// DTO for editing a task's details. Status moves through the lifecycle manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<DbId>,
    pub priority_id: Option<StatusId>,
    pub due_date: Option<Date>,
}

/// Optional filters for listing tasks. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub assigned_to: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub priority_id: Option<StatusId>,
    /// Only tasks due strictly before this date and not yet completed.
    pub overdue_as_of: Option<Date>,
}
