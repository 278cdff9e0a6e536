//! Guard duty and duty issue report models and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// A row from the `guard_duties` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GuardDuty {
    pub id: DbId,
    pub duty_code: String,
    pub employee_id: DbId,
    pub post: String,
    pub shift_start: Timestamp,
    pub shift_end: Timestamp,
    pub status_id: StatusId,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for rostering a guard duty. The duty code is generated on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_shift_window"))]
pub struct CreateGuardDuty {
    pub employee_id: DbId,
    #[validate(length(min = 1))]
    pub post: String,
    pub shift_start: Timestamp,
    pub shift_end: Timestamp,
    pub notes: Option<String>,
}

fn validate_shift_window(input: &CreateGuardDuty) -> Result<(), ValidationError> {
    if input.shift_end <= input.shift_start {
        return Err(ValidationError::new("shift_end_before_start"));
    }
    Ok(())
}

/// DTO for editing a rostered duty. Status moves through the lifecycle manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGuardDuty {
    pub employee_id: Option<DbId>,
    pub post: Option<String>,
    pub shift_start: Option<Timestamp>,
    pub shift_end: Option<Timestamp>,
    pub notes: Option<String>,
}

/// Optional filters for listing duties. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardDutyFilter {
    pub employee_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub post: Option<String>,
    /// Only duties whose shift overlaps `[window_start, window_end)`.
    pub window_start: Option<Timestamp>,
    pub window_end: Option<Timestamp>,
}

/// An append-only issue report filed against a guard duty.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GuardDutyReport {
    pub id: DbId,
    pub guard_duty_id: DbId,
    pub reported_by: Option<DbId>,
    pub description: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
