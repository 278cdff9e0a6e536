//! Visitor entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `visitors` table.
///
/// `visit_count` and `last_visit_date` only move when a visit completes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Visitor {
    pub id: DbId,
    pub prisoner_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub id_document: Option<String>,
    pub relationship: String,
    pub visit_count: i32,
    pub last_visit_date: Option<Date>,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a visitor. New visitors start as Pending unless a
/// status is given.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVisitor {
    pub prisoner_id: DbId,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    pub id_document: Option<String>,
    #[validate(length(min = 1))]
    pub relationship: String,
    pub status_id: Option<StatusId>,
}

/// DTO for updating a visitor. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVisitor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub id_document: Option<String>,
    pub relationship: Option<String>,
    pub status_id: Option<StatusId>,
}

/// Optional filters for listing visitors. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitorFilter {
    pub prisoner_id: Option<DbId>,
    pub status_id: Option<StatusId>,
    pub search: Option<String>,
}

/// Number of registered visitors per prisoner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VisitorCount {
    pub prisoner_id: DbId,
    pub count: i64,
}
