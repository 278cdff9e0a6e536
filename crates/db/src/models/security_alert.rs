//! Security alert entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `security_alerts` table.
///
/// Actor/timestamp pairs are written once, on the matching transition.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SecurityAlert {
    pub id: DbId,
    pub alert_code: String,
    pub alert_type: String,
    pub severity_id: StatusId,
    pub location: String,
    pub description: String,
    pub raised_by: Option<DbId>,
    pub status_id: StatusId,
    pub acknowledged_by: Option<DbId>,
    pub acknowledged_at: Option<Timestamp>,
    pub resolved_by: Option<DbId>,
    pub resolved_at: Option<Timestamp>,
    pub resolution_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for raising an alert. The alert code is generated on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSecurityAlert {
    #[validate(length(min = 1))]
    pub alert_type: String,
    pub severity_id: StatusId,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub raised_by: Option<DbId>,
}

/// Optional filters for listing alerts. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityAlertFilter {
    pub status_id: Option<StatusId>,
    pub severity_id: Option<StatusId>,
    pub location: Option<String>,
    pub raised_from: Option<Timestamp>,
    pub raised_to: Option<Timestamp>,
}
