//! Prisoner entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `prisoners` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prisoner {
    pub id: DbId,
    pub prisoner_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub phone: Option<String>,
    pub crime_description: String,
    pub cell_id: Option<DbId>,
    pub sentence_months: i32,
    pub status_id: StatusId,
    pub admission_date: Date,
    pub release_date: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Prisoner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// DTO for admitting a prisoner. The prisoner number is generated on insert
/// and the cell is assigned by the occupancy tracker.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePrisoner {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub date_of_birth: Option<Date>,
    pub phone: Option<String>,
    #[validate(length(min = 1))]
    pub crime_description: String,
    #[validate(range(min = 0))]
    pub sentence_months: i32,
    /// Defaults to today when absent.
    pub admission_date: Option<Date>,
}

/// DTO for updating personal and sentence details.
///
/// Cell, status, and release date change only through admission, transfer,
/// and release so that cell occupancy stays consistent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrisoner {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub phone: Option<String>,
    pub crime_description: Option<String>,
    pub sentence_months: Option<i32>,
}

/// Optional filters for listing prisoners. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrisonerFilter {
    pub status_id: Option<StatusId>,
    pub cell_id: Option<DbId>,
    /// Case-insensitive match on name or prisoner number.
    pub search: Option<String>,
    pub admitted_from: Option<Date>,
    pub admitted_to: Option<Date>,
}
