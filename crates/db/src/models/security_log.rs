//! Security log entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `security_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SecurityLog {
    pub id: DbId,
    pub log_code: String,
    pub employee_id: Option<DbId>,
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub severity_id: StatusId,
    pub status_id: StatusId,
    pub occurred_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a security event. The log code is generated on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSecurityLog {
    pub employee_id: Option<DbId>,
    pub event_type: String,
    pub description: String,
    pub location: Option<String>,
    pub severity_id: Option<StatusId>,
    /// Defaults to now when absent.
    pub occurred_at: Option<Timestamp>,
}

/// Optional filters for listing log entries. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityLogFilter {
    pub employee_id: Option<DbId>,
    pub event_type: Option<String>,
    pub severity_id: Option<StatusId>,
    pub status_id: Option<StatusId>,
    pub occurred_from: Option<Timestamp>,
    pub occurred_to: Option<Timestamp>,
}
