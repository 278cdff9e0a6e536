//! Per-module permission checks for employees.
//!
//! An employee holds at most one grant per module. A check passes when the
//! employee's account is active and that grant is active, not expired as of
//! today, and at or above the required level in the `View < Edit < Full`
//! hierarchy. Locking an account therefore suspends all of its access
//! without touching the grant rows.

use cellblock_core::error::CoreError;
use cellblock_core::permissions::{grant_allows, validate_module, PermissionLevel};
use cellblock_core::roles::EmployeeRole;
use cellblock_core::types::{Date, DbId};
use cellblock_db::models::access_control::{AccessControl, GrantAccess, ModulePermission};
use cellblock_db::repositories::{AccessControlRepo, EmployeeRepo};
use cellblock_db::DbPool;
use chrono::Utc;

use crate::error::ServiceResult;

/// Evaluates and maintains access-control grants.
#[derive(Clone)]
pub struct PermissionEvaluator {
    pool: DbPool,
}

fn today() -> Date {
    Utc::now().date_naive()
}

impl PermissionEvaluator {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Whether `employee_id` holds at least `required` on `module` today.
    pub async fn has_permission(
        &self,
        employee_id: DbId,
        module: &str,
        required: PermissionLevel,
    ) -> ServiceResult<bool> {
        self.has_permission_on(employee_id, module, required, today())
            .await
    }

    /// [`has_permission`](Self::has_permission) evaluated as of `today`.
    pub async fn has_permission_on(
        &self,
        employee_id: DbId,
        module: &str,
        required: PermissionLevel,
        today: Date,
    ) -> ServiceResult<bool> {
        let active = EmployeeRepo::find_by_id(&self.pool, employee_id)
            .await?
            .is_some_and(|e| e.is_active);
        if !active {
            tracing::debug!(employee_id, module, %required, "No active account");
            return Ok(false);
        }

        let Some(grant) = AccessControlRepo::find(&self.pool, employee_id, module).await? else {
            tracing::debug!(employee_id, module, %required, "No grant for module");
            return Ok(false);
        };

        let granted = PermissionLevel::try_from(grant.permission_level_id)?;
        let allowed = grant_allows(granted, grant.is_active, grant.expires_on, required, today);
        tracing::debug!(
            employee_id,
            module,
            %granted,
            %required,
            is_active = grant.is_active,
            expires_on = ?grant.expires_on,
            allowed,
            "Permission check"
        );
        Ok(allowed)
    }

    /// Like [`has_permission`](Self::has_permission), but a denial is
    /// [`CoreError::Forbidden`].
    pub async fn require_permission(
        &self,
        employee_id: DbId,
        module: &str,
        required: PermissionLevel,
    ) -> ServiceResult<()> {
        if self.has_permission(employee_id, module, required).await? {
            Ok(())
        } else {
            tracing::warn!(employee_id, module, %required, "Permission denied");
            Err(CoreError::Forbidden(format!("{required} access to {module} is required")).into())
        }
    }

    /// Every module the employee can currently use, with its level.
    pub async fn employee_permissions(
        &self,
        employee_id: DbId,
    ) -> ServiceResult<Vec<ModulePermission>> {
        Ok(AccessControlRepo::list_effective_permissions(&self.pool, employee_id, today()).await?)
    }

    /// Grants still flagged active whose expiry date has passed.
    pub async fn expired_access_controls(&self) -> ServiceResult<Vec<AccessControl>> {
        self.expired_access_controls_on(today()).await
    }

    pub async fn expired_access_controls_on(&self, today: Date) -> ServiceResult<Vec<AccessControl>> {
        Ok(AccessControlRepo::find_expired(&self.pool, today).await?)
    }

    /// Deactivate every expired grant. Returns how many were switched off.
    pub async fn deactivate_expired(&self) -> ServiceResult<u64> {
        self.deactivate_expired_on(today()).await
    }

    pub async fn deactivate_expired_on(&self, today: Date) -> ServiceResult<u64> {
        let count = AccessControlRepo::deactivate_expired(&self.pool, today).await?;
        if count > 0 {
            tracing::info!(count, %today, "Expired access grants deactivated");
        }
        Ok(count)
    }

    /// Grant (or re-grant) access to a module, reactivating any earlier row.
    ///
    /// When `granted_by` is given it must name an active administrator,
    /// otherwise the grant is `Forbidden`.
    pub async fn grant(
        &self,
        employee_id: DbId,
        module: &str,
        level: PermissionLevel,
        expires_on: Option<Date>,
        granted_by: Option<DbId>,
    ) -> ServiceResult<AccessControl> {
        validate_module(module).map_err(CoreError::Validation)?;
        if let Some(granter) = granted_by {
            self.ensure_can_manage(granter).await?;
        }

        let input = GrantAccess {
            employee_id,
            module: module.to_string(),
            permission_level_id: level.id(),
            expires_on,
            granted_by,
        };
        let grant = AccessControlRepo::grant(&self.pool, &input).await?;
        tracing::info!(
            employee_id,
            module,
            %level,
            expires_on = ?expires_on,
            granted_by = ?granted_by,
            "Access granted"
        );
        Ok(grant)
    }

    /// Deactivate the employee's grant on a module. Returns `true` if an
    /// active grant existed.
    pub async fn revoke(&self, employee_id: DbId, module: &str) -> ServiceResult<bool> {
        let revoked = AccessControlRepo::revoke(&self.pool, employee_id, module).await?;
        if revoked {
            tracing::info!(employee_id, module, "Access revoked");
        } else {
            tracing::debug!(employee_id, module, "No active grant to revoke");
        }
        Ok(revoked)
    }

    /// Only active administrators may hand out access.
    async fn ensure_can_manage(&self, granter_id: DbId) -> ServiceResult<()> {
        let granter = EmployeeRepo::find_by_id(&self.pool, granter_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee", granter_id))?;
        let role = EmployeeRole::try_from(granter.role_id)?;
        if granter.is_active && role.can_manage_access() {
            return Ok(());
        }
        tracing::warn!(granter_id, %role, is_active = granter.is_active, "Grant refused");
        Err(CoreError::Forbidden(format!("Employee {granter_id} may not manage access")).into())
    }
}
