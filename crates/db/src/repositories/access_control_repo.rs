//! Repository for the `access_controls` table.

use cellblock_core::permissions::PermissionLevel;
use cellblock_core::types::{Date, DbId};
use sqlx::PgPool;

use crate::models::access_control::{AccessControl, GrantAccess, ModulePermission};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, employee_id, module, permission_level_id, expires_on, is_active, \
                        granted_by, created_at, updated_at";

/// Provides grant, lookup, and expiry operations for module access.
///
/// Expiry is date-based: a grant with `expires_on < today` is expired.
/// Callers pass `today` so checks are deterministic in tests.
pub struct AccessControlRepo;

impl AccessControlRepo {
    /// Grant access to a module, replacing any earlier grant for the same
    /// (employee, module) pair and reactivating it.
    pub async fn grant(pool: &PgPool, input: &GrantAccess) -> Result<AccessControl, sqlx::Error> {
        let query = format!(
            "INSERT INTO access_controls
                (employee_id, module, permission_level_id, expires_on, granted_by)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_access_controls_employee_module DO UPDATE SET
                permission_level_id = EXCLUDED.permission_level_id,
                expires_on = EXCLUDED.expires_on,
                granted_by = EXCLUDED.granted_by,
                is_active = TRUE
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessControl>(&query)
            .bind(input.employee_id)
            .bind(&input.module)
            .bind(input.permission_level_id)
            .bind(input.expires_on)
            .bind(input.granted_by)
            .fetch_one(pool)
            .await
    }

    /// Find the grant row for an (employee, module) pair, active or not.
    pub async fn find(
        pool: &PgPool,
        employee_id: DbId,
        module: &str,
    ) -> Result<Option<AccessControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_controls WHERE employee_id = $1 AND module = $2"
        );
        sqlx::query_as::<_, AccessControl>(&query)
            .bind(employee_id)
            .bind(module)
            .fetch_optional(pool)
            .await
    }

    /// Every grant row for an employee, ordered by module.
    pub async fn list_for_employee(
        pool: &PgPool,
        employee_id: DbId,
    ) -> Result<Vec<AccessControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_controls WHERE employee_id = $1 ORDER BY module ASC"
        );
        sqlx::query_as::<_, AccessControl>(&query)
            .bind(employee_id)
            .fetch_all(pool)
            .await
    }

    /// Effective (module, level) pairs for an employee as of `today`.
    ///
    /// Explicit `None` grants and grants held by a locked account are left
    /// out.
    pub async fn list_effective_permissions(
        pool: &PgPool,
        employee_id: DbId,
        today: Date,
    ) -> Result<Vec<ModulePermission>, sqlx::Error> {
        sqlx::query_as::<_, ModulePermission>(
            "SELECT a.module, a.permission_level_id, a.expires_on
             FROM access_controls a
             JOIN employees e ON e.id = a.employee_id
             WHERE a.employee_id = $1
               AND a.is_active = TRUE
               AND e.is_active = TRUE
               AND a.permission_level_id <> $3
               AND (a.expires_on IS NULL OR a.expires_on >= $2)
             ORDER BY a.module ASC",
        )
        .bind(employee_id)
        .bind(today)
        .bind(PermissionLevel::None.id())
        .fetch_all(pool)
        .await
    }

    /// Active grants on a module across all employees.
    pub async fn list_by_module(
        pool: &PgPool,
        module: &str,
    ) -> Result<Vec<AccessControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_controls
             WHERE module = $1 AND is_active = TRUE
             ORDER BY employee_id ASC"
        );
        sqlx::query_as::<_, AccessControl>(&query)
            .bind(module)
            .fetch_all(pool)
            .await
    }

    /// Deactivate the grant for an (employee, module) pair.
    ///
    /// Returns `true` if an active grant was revoked.
    pub async fn revoke(pool: &PgPool, employee_id: DbId, module: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE access_controls SET is_active = FALSE
             WHERE employee_id = $1 AND module = $2 AND is_active = TRUE",
        )
        .bind(employee_id)
        .bind(module)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active grants whose expiry date is before `today`.
    pub async fn find_expired(pool: &PgPool, today: Date) -> Result<Vec<AccessControl>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM access_controls
             WHERE is_active = TRUE AND expires_on < $1
             ORDER BY expires_on ASC, id ASC"
        );
        sqlx::query_as::<_, AccessControl>(&query)
            .bind(today)
            .fetch_all(pool)
            .await
    }

    /// Deactivate every active grant whose expiry date is before `today`.
    ///
    /// Returns the number of grants deactivated.
    pub async fn deactivate_expired(pool: &PgPool, today: Date) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE access_controls SET is_active = FALSE
             WHERE is_active = TRUE AND expires_on < $1",
        )
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove a grant row entirely. Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_controls WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
