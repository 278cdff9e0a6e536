mod common;

use assert_matches::assert_matches;
use cellblock_core::permissions::{PermissionLevel, MODULE_CELLS, MODULE_REPORTS, VALID_MODULES};
use cellblock_core::roles::EmployeeRole;
use cellblock_db::repositories::{AccessControlRepo, EmployeeRepo};
use cellblock_services::{ErrorKind, NewEmployee};
use sqlx::PgPool;

fn administrator(username: &str) -> NewEmployee {
    NewEmployee {
        role: EmployeeRole::Administrator,
        ..common::new_employee(username, common::PASSWORD)
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_administrator_is_provisioned_once(pool: PgPool) {
    let office = common::office(pool.clone());

    let (admin, granted) = office
        .ensure_administrator(&administrator("warden"))
        .await
        .unwrap();
    assert_eq!(granted.len(), VALID_MODULES.len());
    for module in VALID_MODULES {
        assert!(office
            .permissions
            .has_permission(admin.id, module, PermissionLevel::Full)
            .await
            .unwrap());
    }

    let (again, granted) = office
        .ensure_administrator(&administrator("warden"))
        .await
        .unwrap();
    assert_eq!(again.id, admin.id);
    assert!(granted.is_empty());
    assert_eq!(EmployeeRepo::list(&pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_interrupted_provisioning_is_completed(pool: PgPool) {
    let office = common::office(pool.clone());
    let (admin, _) = office
        .ensure_administrator(&administrator("warden"))
        .await
        .unwrap();

    // One grant revoked, another never written.
    office.permissions.revoke(admin.id, MODULE_CELLS).await.unwrap();
    let reports = AccessControlRepo::find(&pool, admin.id, MODULE_REPORTS)
        .await
        .unwrap()
        .unwrap();
    assert!(AccessControlRepo::delete(&pool, reports.id).await.unwrap());

    let (_, mut granted) = office
        .ensure_administrator(&administrator("warden"))
        .await
        .unwrap();
    granted.sort_unstable();
    let mut expected = vec![MODULE_CELLS, MODULE_REPORTS];
    expected.sort_unstable();
    assert_eq!(granted, expected);

    let effective = office.permissions.employee_permissions(admin.id).await.unwrap();
    assert_eq!(effective.len(), VALID_MODULES.len());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bootstrap_requires_an_administrator(pool: PgPool) {
    let office = common::office(pool.clone());

    let officer = common::new_employee("warden", common::PASSWORD);
    let err = office.ensure_administrator(&officer).await.unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Validation);
    assert!(EmployeeRepo::list(&pool).await.unwrap().is_empty());

    // The username is already held by an officer.
    common::staff(&pool, "WARDEN").await;
    let err = office
        .ensure_administrator(&administrator("warden"))
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
}
