mod common;

use assert_matches::assert_matches;
use cellblock_core::permissions::{PermissionLevel, MODULE_CELLS, MODULE_SECURITY, MODULE_TASKS};
use cellblock_core::roles::EmployeeRole;
use cellblock_services::ErrorKind;
use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_grant_denies_and_is_reported(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    let yesterday = today().checked_sub_days(Days::new(1)).unwrap();

    let grant = office
        .permissions
        .grant(emp.id, MODULE_SECURITY, PermissionLevel::View, Some(yesterday), None)
        .await
        .unwrap();
    assert!(grant.is_active);

    let allowed = office
        .permissions
        .has_permission(emp.id, MODULE_SECURITY, PermissionLevel::View)
        .await
        .unwrap();
    assert!(!allowed, "expired grant must not satisfy a check");

    let expired = office.permissions.expired_access_controls().await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].employee_id, emp.id);
    assert_eq!(expired[0].module, MODULE_SECURITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_grant_expiring_today_still_allows(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

    office
        .permissions
        .grant(emp.id, MODULE_CELLS, PermissionLevel::Edit, Some(day), None)
        .await
        .unwrap();

    let on_day = office
        .permissions
        .has_permission_on(emp.id, MODULE_CELLS, PermissionLevel::Edit, day)
        .await
        .unwrap();
    assert!(on_day);

    let after = office
        .permissions
        .has_permission_on(emp.id, MODULE_CELLS, PermissionLevel::Edit, day.succ_opt().unwrap())
        .await
        .unwrap();
    assert!(!after);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_levels_are_hierarchical(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    office
        .permissions
        .grant(emp.id, MODULE_TASKS, PermissionLevel::Edit, None, None)
        .await
        .unwrap();

    for (level, expected) in [
        (PermissionLevel::View, true),
        (PermissionLevel::Edit, true),
        (PermissionLevel::Full, false),
    ] {
        let allowed = office
            .permissions
            .has_permission(emp.id, MODULE_TASKS, level)
            .await
            .unwrap();
        assert_eq!(allowed, expected, "Edit grant checked against {level}");
    }

    // No grant on the module at all.
    assert!(!office
        .permissions
        .has_permission(emp.id, MODULE_CELLS, PermissionLevel::View)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_none_level_never_allows(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    office
        .permissions
        .grant(emp.id, MODULE_TASKS, PermissionLevel::None, None, None)
        .await
        .unwrap();

    assert!(!office
        .permissions
        .has_permission(emp.id, MODULE_TASKS, PermissionLevel::View)
        .await
        .unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_revoke_denies_and_require_is_forbidden(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    office
        .permissions
        .grant(emp.id, MODULE_SECURITY, PermissionLevel::Full, None, None)
        .await
        .unwrap();
    office
        .permissions
        .require_permission(emp.id, MODULE_SECURITY, PermissionLevel::Full)
        .await
        .unwrap();

    assert!(office.permissions.revoke(emp.id, MODULE_SECURITY).await.unwrap());
    assert!(!office.permissions.revoke(emp.id, MODULE_SECURITY).await.unwrap());

    let err = office
        .permissions
        .require_permission(emp.id, MODULE_SECURITY, PermissionLevel::View)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Forbidden);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deactivate_expired_sweeps_only_expired(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

    office
        .permissions
        .grant(emp.id, MODULE_SECURITY, PermissionLevel::View, day.pred_opt(), None)
        .await
        .unwrap();
    office
        .permissions
        .grant(emp.id, MODULE_TASKS, PermissionLevel::View, None, None)
        .await
        .unwrap();

    assert_eq!(office.permissions.deactivate_expired_on(day).await.unwrap(), 1);
    assert_eq!(office.permissions.deactivate_expired_on(day).await.unwrap(), 0);
    assert!(office
        .permissions
        .expired_access_controls_on(day)
        .await
        .unwrap()
        .is_empty());

    let effective = office.permissions.employee_permissions(emp.id).await.unwrap();
    let modules: Vec<_> = effective.iter().map(|p| p.module.as_str()).collect();
    assert_eq!(modules, vec![MODULE_TASKS]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_module_rejected(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;

    let err = office
        .permissions
        .grant(emp.id, "Kitchen", PermissionLevel::View, None, None)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Validation);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_grant_for_missing_employee_conflicts(pool: PgPool) {
    let office = common::office(pool);
    let err = office
        .permissions
        .grant(999_999, MODULE_TASKS, PermissionLevel::View, None, None)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_only_administrators_grant_access(pool: PgPool) {
    let office = common::office(pool.clone());
    let admin = common::staff_with_role(&pool, "ADM001", EmployeeRole::Administrator).await;
    let officer = common::staff(&pool, "EMP001").await;
    let recruit = common::staff(&pool, "EMP002").await;

    let grant = office
        .permissions
        .grant(recruit.id, MODULE_TASKS, PermissionLevel::View, None, Some(admin.id))
        .await
        .unwrap();
    assert_eq!(grant.granted_by, Some(admin.id));

    let err = office
        .permissions
        .grant(recruit.id, MODULE_CELLS, PermissionLevel::View, None, Some(officer.id))
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Forbidden);

    office.auth.lock_account(admin.id).await.unwrap();
    let err = office
        .permissions
        .grant(recruit.id, MODULE_CELLS, PermissionLevel::View, None, Some(admin.id))
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Forbidden);

    let err = office
        .permissions
        .grant(recruit.id, MODULE_CELLS, PermissionLevel::View, None, Some(999_999))
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_locked_account_loses_access(pool: PgPool) {
    let office = common::office(pool.clone());
    let emp = common::staff(&pool, "EMP001").await;
    office
        .permissions
        .grant(emp.id, MODULE_CELLS, PermissionLevel::Full, None, None)
        .await
        .unwrap();
    office
        .permissions
        .grant(emp.id, MODULE_TASKS, PermissionLevel::None, None, None)
        .await
        .unwrap();

    let listed = office.permissions.employee_permissions(emp.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].module, MODULE_CELLS);

    office.auth.lock_account(emp.id).await.unwrap();
    assert!(!office
        .permissions
        .has_permission(emp.id, MODULE_CELLS, PermissionLevel::View)
        .await
        .unwrap());
    let err = office
        .permissions
        .require_permission(emp.id, MODULE_CELLS, PermissionLevel::View)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Forbidden);
    assert!(office.permissions.employee_permissions(emp.id).await.unwrap().is_empty());

    // The grant row survives, so unlocking restores access.
    office.auth.unlock_account(emp.id).await.unwrap();
    assert!(office
        .permissions
        .has_permission(emp.id, MODULE_CELLS, PermissionLevel::Full)
        .await
        .unwrap());
}
