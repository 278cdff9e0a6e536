//! First-start administrator provisioning.

use cellblock_core::error::CoreError;
use cellblock_core::permissions::{grant_allows, PermissionLevel, VALID_MODULES};
use cellblock_core::roles::EmployeeRole;
use cellblock_db::models::employee::Employee;
use cellblock_db::repositories::{AccessControlRepo, EmployeeRepo};
use chrono::Utc;

use crate::auth::NewEmployee;
use crate::error::ServiceResult;
use crate::BackOffice;

impl BackOffice {
    /// Make sure `account` exists as an administrator with full access to
    /// every module.
    ///
    /// Safe to run on every start: the account is registered only when the
    /// username is free, and any module lacking a usable `Full` grant is
    /// granted again. Returns the employee and the modules granted by this
    /// call, so an interrupted earlier run is completed here.
    pub async fn ensure_administrator(
        &self,
        account: &NewEmployee,
    ) -> ServiceResult<(Employee, Vec<&'static str>)> {
        if account.role != EmployeeRole::Administrator {
            return Err(CoreError::Validation(format!(
                "Bootstrap account must be an Administrator, not {}",
                account.role
            ))
            .into());
        }

        let employee = match EmployeeRepo::find_by_username(&self.pool, &account.username).await? {
            Some(existing) => {
                let role = EmployeeRole::try_from(existing.role_id)?;
                if role != EmployeeRole::Administrator {
                    return Err(CoreError::Conflict(format!(
                        "Username {} belongs to a {role}",
                        account.username
                    ))
                    .into());
                }
                tracing::debug!(username = %account.username, "Administrator already exists");
                existing
            }
            None => self.auth.register_employee(account).await?,
        };

        let today = Utc::now().date_naive();
        let mut granted = Vec::new();
        for module in VALID_MODULES.iter().copied() {
            let usable = match AccessControlRepo::find(&self.pool, employee.id, module).await? {
                Some(grant) => grant_allows(
                    PermissionLevel::try_from(grant.permission_level_id)?,
                    grant.is_active,
                    grant.expires_on,
                    PermissionLevel::Full,
                    today,
                ),
                None => false,
            };
            if !usable {
                self.permissions
                    .grant(employee.id, module, PermissionLevel::Full, None, None)
                    .await?;
                granted.push(module);
            }
        }

        if !granted.is_empty() {
            tracing::info!(
                employee_id = employee.id,
                username = %employee.username,
                modules = granted.len(),
                "Administrator access provisioned"
            );
        }
        Ok((employee, granted))
    }
}
