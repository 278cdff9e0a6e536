//! Visit entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `visits` table.
///
/// `actual_start_at` is set on entering In Progress and `actual_end_at` on
/// entering Completed; neither is written anywhere else.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Visit {
    pub id: DbId,
    pub visit_code: String,
    pub prisoner_id: DbId,
    pub visitor_id: DbId,
    pub scheduled_at: Timestamp,
    pub duration_minutes: i32,
    pub status_id: StatusId,
    pub actual_start_at: Option<Timestamp>,
    pub actual_end_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for scheduling a visit. The visit code is generated on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVisit {
    pub prisoner_id: DbId,
    pub visitor_id: DbId,
    pub scheduled_at: Timestamp,
    #[validate(range(min = 1, max = 480))]
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

/// DTO for rescheduling a visit. Status moves through the lifecycle manager.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVisit {
    pub scheduled_at: Option<Timestamp>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
}

/// Optional filters for listing visits. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitFilter {
    pub prisoner_id: Option<DbId>,
    pub visitor_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub scheduled_from: Option<Timestamp>,
    pub scheduled_to: Option<Timestamp>,
}
