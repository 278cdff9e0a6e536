//! Emergency procedure entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `emergency_procedures` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmergencyProcedure {
    pub id: DbId,
    pub title: String,
    pub procedure_type: String,
    pub description: String,
    /// Newline-separated ordered steps.
    pub steps: String,
    pub responsible_role_id: Option<StatusId>,
    pub is_active: bool,
    pub last_reviewed_on: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EmergencyProcedure {
    /// Steps in order, skipping blank lines.
    pub fn step_list(&self) -> Vec<&str> {
        self.steps
            .lines()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// DTO for creating a procedure.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmergencyProcedure {
    pub title: String,
    pub procedure_type: String,
    pub description: String,
    pub steps: String,
    pub responsible_role_id: Option<StatusId>,
}

/// DTO for updating a procedure. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmergencyProcedure {
    pub title: Option<String>,
    pub procedure_type: Option<String>,
    pub description: Option<String>,
    pub steps: Option<String>,
    pub responsible_role_id: Option<StatusId>,
    pub is_active: Option<bool>,
    pub last_reviewed_on: Option<Date>,
}
