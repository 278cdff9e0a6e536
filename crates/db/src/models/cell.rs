//! Cell entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `cells` table.
///
/// `current_occupancy` is maintained by the occupancy tracker only; the
/// `ck_cells_occupancy` constraint keeps it within `0..=capacity`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cell {
    pub id: DbId,
    pub cell_number: String,
    pub block: String,
    pub cell_type: String,
    pub capacity: i32,
    pub current_occupancy: i32,
    pub security_level_id: StatusId,
    pub status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cell {
    /// Whether another prisoner fits in this cell.
    pub fn has_available_space(&self) -> bool {
        self.current_occupancy < self.capacity
    }

    /// Beds still free.
    pub fn free_beds(&self) -> i32 {
        (self.capacity - self.current_occupancy).max(0)
    }
}

/// DTO for creating a new cell. Occupancy always starts at zero.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCell {
    #[validate(length(min = 1, max = 32))]
    pub cell_number: String,
    #[validate(length(min = 1))]
    pub block: String,
    #[validate(length(min = 1))]
    pub cell_type: String,
    #[validate(range(min = 0, max = 64))]
    pub capacity: i32,
    pub security_level_id: StatusId,
}

/// DTO for updating a cell.
///
/// Occupancy and status are absent: Vacant/Occupied follow the occupancy
/// count, and maintenance is toggled through `CellRepo::set_maintenance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCell {
    pub block: Option<String>,
    pub cell_type: Option<String>,
    pub capacity: Option<i32>,
    pub security_level_id: Option<StatusId>,
}

/// Optional filters for listing cells. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellFilter {
    pub block: Option<String>,
    pub status_id: Option<StatusId>,
    pub security_level_id: Option<StatusId>,
    /// Only cells with at least one free bed.
    pub with_space: Option<bool>,
}

/// Facility-wide occupancy figures.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OccupancySummary {
    pub total_cells: i64,
    pub total_capacity: i64,
    pub total_occupancy: i64,
    pub full_cells: i64,
    pub vacant_cells: i64,
}

/// A cell whose stored occupancy disagrees with the prisoners assigned to it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OccupancyDrift {
    pub cell_id: DbId,
    pub cell_number: String,
    pub current_occupancy: i32,
    pub actual_occupancy: i64,
}
