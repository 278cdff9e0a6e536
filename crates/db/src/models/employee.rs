//! Employee entity model and DTOs.

use cellblock_core::status::StatusId;
use cellblock_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full employee row from the `employees` table.
///
/// Contains the password hash -- NEVER serialize this directly.
/// Use [`EmployeeProfile`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: DbId,
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub job_title: String,
    pub department: String,
    pub salary_cents: i64,
    pub hire_date: Date,
    pub username: String,
    pub password_hash: String,
    pub role_id: StatusId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe employee representation (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeProfile {
    pub id: DbId,
    pub employee_code: String,
    pub full_name: String,
    pub job_title: String,
    pub department: String,
    pub username: String,
    pub role_id: StatusId,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
}

impl From<&Employee> for EmployeeProfile {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id,
            employee_code: e.employee_code.clone(),
            full_name: format!("{} {}", e.first_name, e.last_name),
            job_title: e.job_title.clone(),
            department: e.department.clone(),
            username: e.username.clone(),
            role_id: e.role_id,
            is_active: e.is_active,
            last_login_at: e.last_login_at,
        }
    }
}

/// DTO for inserting an employee. The password must already be hashed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployee {
    pub employee_code: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub job_title: String,
    pub department: String,
    pub salary_cents: i64,
    pub hire_date: Option<Date>,
    pub username: String,
    pub password_hash: String,
    pub role_id: StatusId,
}

/// DTO for updating an employee. All fields are optional.
///
/// Credentials and the active flag have dedicated repository methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub salary_cents: Option<i64>,
    pub role_id: Option<StatusId>,
}

/// Optional filters for listing employees. `None` fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub role_id: Option<StatusId>,
    pub is_active: Option<bool>,
    /// Case-insensitive match on name, code, or username.
    pub search: Option<String>,
}
