//! Credential checks and account bookkeeping.

pub mod password;

use cellblock_core::error::CoreError;
use cellblock_core::roles::EmployeeRole;
use cellblock_core::types::{Date, DbId};
use cellblock_db::models::employee::{CreateEmployee, Employee};
use cellblock_db::repositories::EmployeeRepo;
use cellblock_db::DbPool;
use validator::Validate;

use crate::error::ServiceResult;
use password::{hash_password, validate_password_strength, verify_password};

/// Default minimum password length.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 12;

/// Password policy settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Registration input carrying a cleartext password.
///
/// The password is hashed before anything is written.
#[derive(Debug, Clone, Validate)]
pub struct NewEmployee {
    #[validate(length(min = 1, max = 32))]
    pub employee_code: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub job_title: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[validate(range(min = 0))]
    pub salary_cents: i64,
    pub hire_date: Option<Date>,
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    pub password: String,
    pub role: EmployeeRole,
}

/// Authenticates employees and manages their credentials and lock state.
#[derive(Clone)]
pub struct AuthGateway {
    pool: DbPool,
    config: AuthConfig,
}

impl AuthGateway {
    pub fn new(pool: DbPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    /// Check a username/password pair.
    ///
    /// On success the login time is stamped and the refreshed row returned.
    /// Unknown users, inactive accounts, and wrong passwords all yield
    /// `Ok(None)` and leave the row untouched.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> ServiceResult<Option<Employee>> {
        let Some(employee) = EmployeeRepo::find_by_username(&self.pool, username).await? else {
            tracing::warn!(username, "Login failed: unknown username");
            return Ok(None);
        };

        if !employee.is_active {
            tracing::warn!(username, employee_id = employee.id, "Login failed: account locked");
            return Ok(None);
        }

        if !verify_password(password, &employee.password_hash)? {
            tracing::warn!(username, employee_id = employee.id, "Login failed: wrong password");
            return Ok(None);
        }

        let refreshed = EmployeeRepo::record_login(&self.pool, employee.id).await?;
        if let Some(e) = &refreshed {
            tracing::info!(username, employee_id = e.id, "Login succeeded");
        }
        Ok(refreshed)
    }

    /// Validate, hash, and store a new employee account.
    pub async fn register_employee(&self, input: &NewEmployee) -> ServiceResult<Employee> {
        input.validate()?;
        validate_password_strength(&input.password, self.config.min_password_length)
            .map_err(CoreError::Validation)?;

        if EmployeeRepo::username_exists(&self.pool, &input.username).await? {
            return Err(CoreError::Conflict(format!(
                "Username '{}' is already taken",
                input.username
            ))
            .into());
        }

        let create = CreateEmployee {
            employee_code: input.employee_code.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            job_title: input.job_title.clone(),
            department: input.department.clone(),
            salary_cents: input.salary_cents,
            hire_date: input.hire_date,
            username: input.username.clone(),
            password_hash: hash_password(&input.password)?,
            role_id: input.role.id(),
        };

        let employee = EmployeeRepo::create(&self.pool, &create).await?;
        tracing::info!(
            employee_id = employee.id,
            username = %employee.username,
            role = %input.role,
            "Employee registered"
        );
        Ok(employee)
    }

    /// Replace a password after confirming the current one.
    pub async fn change_password(
        &self,
        employee_id: DbId,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let employee = EmployeeRepo::find_by_id(&self.pool, employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", employee_id))?;

        if !verify_password(current_password, &employee.password_hash)? {
            tracing::warn!(employee_id, "Password change rejected: wrong current password");
            return Err(CoreError::Unauthorized("Current password is incorrect".into()).into());
        }

        validate_password_strength(new_password, self.config.min_password_length)
            .map_err(CoreError::Validation)?;

        let hash = hash_password(new_password)?;
        EmployeeRepo::update_password(&self.pool, employee_id, &hash).await?;
        tracing::info!(employee_id, "Password changed");
        Ok(())
    }

    pub async fn username_exists(&self, username: &str) -> ServiceResult<bool> {
        Ok(EmployeeRepo::username_exists(&self.pool, username).await?)
    }

    /// Whether the account may log in. Missing accounts are `NotFound`.
    pub async fn is_account_active(&self, employee_id: DbId) -> ServiceResult<bool> {
        let employee = EmployeeRepo::find_by_id(&self.pool, employee_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", employee_id))?;
        Ok(employee.is_active)
    }

    /// Deactivate an account. Returns `true` if the account exists.
    pub async fn lock_account(&self, employee_id: DbId) -> ServiceResult<bool> {
        let changed = EmployeeRepo::set_active(&self.pool, employee_id, false).await?;
        if changed {
            tracing::info!(employee_id, "Account locked");
        }
        Ok(changed)
    }

    /// Reactivate an account. Returns `true` if the account exists.
    pub async fn unlock_account(&self, employee_id: DbId) -> ServiceResult<bool> {
        let changed = EmployeeRepo::set_active(&self.pool, employee_id, true).await?;
        if changed {
            tracing::info!(employee_id, "Account unlocked");
        }
        Ok(changed)
    }
}
