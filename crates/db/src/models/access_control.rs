//! Access-control entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `access_controls` table.
///
/// At most one row exists per (employee, module) pair; revocation clears
/// `is_active` rather than deleting the row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessControl {
    pub id: DbId,
    pub employee_id: DbId,
    pub module: String,
    pub permission_level_id: StatusId,
    pub expires_on: Option<Date>,
    pub is_active: bool,
    pub granted_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for granting (or re-granting) access to a module.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantAccess {
    pub employee_id: DbId,
    pub module: String,
    pub permission_level_id: StatusId,
    pub expires_on: Option<Date>,
    pub granted_by: Option<DbId>,
}

/// A (module, level) pair for authorization summaries.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ModulePermission {
    pub module: String,
    pub permission_level_id: StatusId,
    pub expires_on: Option<Date>,
}
