//! Repository for the `employees` table.

use cellblock_core::types::DbId;
use sqlx::PgPool;

use crate::models::employee::{CreateEmployee, Employee, EmployeeFilter, UpdateEmployee};
use crate::models::stats::StatusCount;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, employee_code, first_name, last_name, phone, email, job_title, \
                        department, salary_cents, hire_date, username, password_hash, role_id, \
                        is_active, last_login_at, created_at, updated_at";

/// Provides CRUD operations for employees.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert a new employee, returning the created row.
    ///
    /// If `hire_date` is `None`, the column default (`CURRENT_DATE`) is used.
    pub async fn create(pool: &PgPool, input: &CreateEmployee) -> Result<Employee, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees
                (employee_code, first_name, last_name, phone, email, job_title, department,
                 salary_cents, hire_date, username, password_hash, role_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, CURRENT_DATE), $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(&input.employee_code)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.job_title)
            .bind(&input.department)
            .bind(input.salary_cents)
            .bind(input.hire_date)
            .bind(&input.username)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    /// Find an employee by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE id = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an employee by staff code (e.g. `EMP001`).
    pub async fn find_by_code(
        pool: &PgPool,
        employee_code: &str,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE employee_code = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(employee_code)
            .fetch_optional(pool)
            .await
    }

    /// Find an employee by username, active or not.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM employees WHERE username = $1");
        sqlx::query_as::<_, Employee>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// List all employees ordered by last name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees ORDER BY last_name ASC, first_name ASC"
        );
        sqlx::query_as::<_, Employee>(&query).fetch_all(pool).await
    }

    /// List employees matching every provided filter field.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &EmployeeFilter,
    ) -> Result<Vec<Employee>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM employees
             WHERE ($1::TEXT IS NULL OR department = $1)
               AND ($2::SMALLINT IS NULL OR role_id = $2)
               AND ($3::BOOLEAN IS NULL OR is_active = $3)
               AND ($4::TEXT IS NULL
                    OR first_name ILIKE '%' || $4 || '%'
                    OR last_name ILIKE '%' || $4 || '%'
                    OR employee_code ILIKE '%' || $4 || '%'
                    OR username ILIKE '%' || $4 || '%')
             ORDER BY last_name ASC, first_name ASC"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(&filter.department)
            .bind(filter.role_id)
            .bind(filter.is_active)
            .bind(&filter.search)
            .fetch_all(pool)
            .await
    }

    /// Update an employee. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEmployee,
    ) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "UPDATE employees SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                job_title = COALESCE($6, job_title),
                department = COALESCE($7, department),
                salary_cents = COALESCE($8, salary_cents),
                role_id = COALESCE($9, role_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.job_title)
            .bind(&input.department)
            .bind(input.salary_cents)
            .bind(input.role_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored password hash. Returns `true` if the row exists.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE employees SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Activate or deactivate an account. Returns `true` if the row exists.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE employees SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp `last_login_at` on an active account and return the fresh row.
    ///
    /// Returns `None` if the account does not exist or has been deactivated
    /// since the caller looked it up.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<Option<Employee>, sqlx::Error> {
        let query = format!(
            "UPDATE employees SET last_login_at = NOW()
             WHERE id = $1 AND is_active = TRUE
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether any account, active or not, uses this username.
    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM employees WHERE username = $1)")
                .bind(username)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Delete an employee. Access grants and guard duties cascade; other
    /// references are cleared.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active employee counts grouped by role.
    pub async fn count_by_role(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT role_id AS status_id, COUNT(*) AS count FROM employees
             WHERE is_active = TRUE
             GROUP BY role_id ORDER BY role_id",
        )
        .fetch_all(pool)
        .await
    }
}
