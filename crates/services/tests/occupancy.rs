mod common;

use assert_matches::assert_matches;
use cellblock_core::status::{CellStatus, PrisonerStatus, VisitorStatus};
use cellblock_db::repositories::{CellRepo, PrisonerRepo, VisitorRepo};
use cellblock_services::{ErrorKind, ServiceError};
use chrono::NaiveDate;
use sqlx::PgPool;

async fn occupancy(pool: &PgPool, number: &str) -> i32 {
    CellRepo::find_by_number(pool, number)
        .await
        .unwrap()
        .unwrap()
        .current_occupancy
}

// ---------------------------------------------------------------------------
// Bed counting
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_last_bed_then_full(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 4).await;
    for _ in 0..3 {
        office.occupancy.increment_occupancy("A-101").await.unwrap();
    }
    assert!(office.occupancy.has_available_space("A-101").await.unwrap());

    let cell = office.occupancy.increment_occupancy("A-101").await.unwrap();
    assert_eq!(cell.current_occupancy, 4);
    assert_eq!(cell.status_id, CellStatus::Occupied.id());
    assert!(!office.occupancy.has_available_space("A-101").await.unwrap());

    let err = office
        .occupancy
        .increment_occupancy("A-101")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
    assert_eq!(occupancy(&pool, "A-101").await, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_decrement_empty_cell_conflicts(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 2).await;
    office.occupancy.increment_occupancy("A-101").await.unwrap();

    let cell = office.occupancy.decrement_occupancy("A-101").await.unwrap();
    assert_eq!(cell.current_occupancy, 0);
    assert_eq!(cell.status_id, CellStatus::Vacant.id());

    let err = office
        .occupancy
        .decrement_occupancy("A-101")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
    assert_eq!(occupancy(&pool, "A-101").await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_cell_is_not_found(pool: PgPool) {
    let office = common::office(pool);
    let err = office
        .occupancy
        .increment_occupancy("Z-999")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);

    let err = office
        .occupancy
        .has_available_space("Z-999")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_maintenance_cell_takes_no_prisoners(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 4).await;
    let closed = office.occupancy.set_maintenance("A-101", true).await.unwrap();
    assert_eq!(closed.status_id, CellStatus::UnderMaintenance.id());

    assert!(!office.occupancy.has_available_space("A-101").await.unwrap());
    let err = office
        .occupancy
        .admit_prisoner(&common::new_prisoner("John", "Doe"), "A-101")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
    assert!(PrisonerRepo::list(&pool).await.unwrap().is_empty());

    let reopened = office.occupancy.set_maintenance("A-101", false).await.unwrap();
    assert_eq!(reopened.status_id, CellStatus::Vacant.id());
    common::housed(&office, "A-101").await;
    assert_eq!(occupancy(&pool, "A-101").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reopened_cell_keeps_occupied_status(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 4).await;
    common::housed(&office, "A-101").await;

    office.occupancy.set_maintenance("A-101", true).await.unwrap();
    let reopened = office.occupancy.set_maintenance("A-101", false).await.unwrap();
    assert_eq!(reopened.status_id, CellStatus::Occupied.id());
    assert_eq!(reopened.current_occupancy, 1);

    let err = office
        .occupancy
        .set_maintenance("Z-999", true)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_register_cell_validates(pool: PgPool) {
    let office = common::office(pool);
    let mut input = cellblock_db::models::cell::CreateCell {
        cell_number: String::new(),
        block: "A".to_string(),
        cell_type: "Standard".to_string(),
        capacity: 2,
        security_level_id: 1,
    };
    let err = office.occupancy.register_cell(&input).await.unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Validation);

    input.cell_number = "A-101".to_string();
    let cell = office.occupancy.register_cell(&input).await.unwrap();
    assert_eq!(cell.status_id, CellStatus::Vacant.id());

    let err = office.occupancy.register_cell(&input).await.unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
}

// ---------------------------------------------------------------------------
// Prisoner movements
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admit_reserves_bed(pool: PgPool) {
    let office = common::office(pool.clone());
    let cell = common::cell(&pool, "A-101", 1).await;

    let prisoner = common::housed(&office, "A-101").await;
    assert_eq!(prisoner.cell_id, Some(cell.id));
    assert_eq!(prisoner.status_id, PrisonerStatus::InCustody.id());
    assert_eq!(occupancy(&pool, "A-101").await, 1);

    // The cell is now full; a second admission leaves no prisoner row behind.
    let err = office
        .occupancy
        .admit_prisoner(&common::new_prisoner("Mary", "Major"), "A-101")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
    assert_eq!(PrisonerRepo::list(&pool).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transfer_moves_bed(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 2).await;
    let target = common::cell(&pool, "B-201", 2).await;
    let prisoner = common::housed(&office, "A-101").await;

    let moved = office
        .occupancy
        .transfer_prisoner(prisoner.id, "B-201")
        .await
        .unwrap();
    assert_eq!(moved.cell_id, Some(target.id));
    assert_eq!(occupancy(&pool, "A-101").await, 0);
    assert_eq!(occupancy(&pool, "B-201").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transfer_to_same_cell_is_noop(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 1).await;
    let prisoner = common::housed(&office, "A-101").await;

    let same = office
        .occupancy
        .transfer_prisoner(prisoner.id, "A-101")
        .await
        .unwrap();
    assert_eq!(same.cell_id, prisoner.cell_id);
    assert_eq!(occupancy(&pool, "A-101").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transfer_into_full_cell_rolls_back(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 1).await;
    common::cell(&pool, "B-201", 1).await;
    let mover = common::housed(&office, "A-101").await;
    common::housed(&office, "B-201").await;

    let err = office
        .occupancy
        .transfer_prisoner(mover.id, "B-201")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);

    let unchanged = PrisonerRepo::find_by_id(&pool, mover.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.cell_id, mover.cell_id);
    assert_eq!(occupancy(&pool, "A-101").await, 1);
    assert_eq!(occupancy(&pool, "B-201").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_release_frees_bed_once(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 2).await;
    let prisoner = common::housed(&office, "A-101").await;
    let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let released = office
        .occupancy
        .release_prisoner(prisoner.id, day)
        .await
        .unwrap();
    assert_eq!(released.status_id, PrisonerStatus::Released.id());
    assert_eq!(released.release_date, Some(day));
    assert_eq!(released.cell_id, None);
    assert_eq!(occupancy(&pool, "A-101").await, 0);

    let err = office
        .occupancy
        .release_prisoner(prisoner.id, day)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);

    let err = office
        .occupancy
        .transfer_prisoner(prisoner.id, "A-101")
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transfer_out_marks_transferred(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 2).await;
    let prisoner = common::housed(&office, "A-101").await;
    let day = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let gone = office.occupancy.transfer_out(prisoner.id, day).await.unwrap();
    assert_eq!(gone.status_id, PrisonerStatus::Transferred.id());
    assert_eq!(occupancy(&pool, "A-101").await, 0);

    let err = office
        .occupancy
        .transfer_out(999_999, day)
        .await
        .unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purge_frees_bed_and_removes_visitors(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 2).await;
    let prisoner = common::housed(&office, "A-101").await;
    let visitor = common::visitor(&pool, prisoner.id, VisitorStatus::Approved).await;

    office.occupancy.purge_prisoner(prisoner.id).await.unwrap();

    assert_eq!(occupancy(&pool, "A-101").await, 0);
    assert!(PrisonerRepo::find_by_id(&pool, prisoner.id)
        .await
        .unwrap()
        .is_none());
    assert!(VisitorRepo::find_by_id(&pool, visitor.id)
        .await
        .unwrap()
        .is_none());

    let err = office.occupancy.purge_prisoner(prisoner.id).await.unwrap_err();
    assert_matches!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reconcile_repairs_drift(pool: PgPool) {
    let office = common::office(pool.clone());
    let cell = common::cell(&pool, "A-101", 3).await;

    // Two prisoners housed without going through the tracker.
    for _ in 0..2 {
        PrisonerRepo::create(&pool, &common::new_prisoner("John", "Doe"), Some(cell.id))
            .await
            .unwrap();
    }

    let drift = office.occupancy.find_drift().await.unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].actual_occupancy, 2);

    let fixed = office.occupancy.reconcile("A-101").await.unwrap();
    assert_eq!(fixed.current_occupancy, 2);
    assert_eq!(fixed.status_id, CellStatus::Occupied.id());
    assert!(office.occupancy.find_drift().await.unwrap().is_empty());

    let summary = office.occupancy.occupancy_summary().await.unwrap();
    assert_eq!(summary.total_occupancy, 2);
    assert_eq!(summary.total_capacity, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reconcile_over_capacity_conflicts(pool: PgPool) {
    let office = common::office(pool.clone());
    let cell = common::cell(&pool, "A-101", 1).await;
    for _ in 0..2 {
        PrisonerRepo::create(&pool, &common::new_prisoner("John", "Doe"), Some(cell.id))
            .await
            .unwrap();
    }

    let err = office.occupancy.reconcile("A-101").await.unwrap_err();
    assert_matches!(err.kind(), ErrorKind::Conflict);
    assert_eq!(occupancy(&pool, "A-101").await, 0);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_increments_never_overfill(pool: PgPool) {
    let office = common::office(pool.clone());
    common::cell(&pool, "A-101", 4).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let office = office.clone();
            tokio::spawn(async move { office.occupancy.increment_occupancy("A-101").await })
        })
        .collect();

    let mut taken = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => taken += 1,
            Err(err) => assert_matches!(err.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(taken, 4);
    assert_eq!(occupancy(&pool, "A-101").await, 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_opposite_transfers_do_not_deadlock(pool: PgPool) {
    let office = common::office(pool.clone());
    let a = common::cell(&pool, "A-101", 50).await;
    let b = common::cell(&pool, "B-101", 50).await;

    let mut moves = Vec::new();
    for _ in 0..20 {
        moves.push((common::housed(&office, "A-101").await.id, "B-101"));
        moves.push((common::housed(&office, "B-101").await.id, "A-101"));
    }

    let handles: Vec<_> = moves
        .into_iter()
        .map(|(prisoner_id, target)| {
            let office = office.clone();
            tokio::spawn(async move {
                office.occupancy.transfer_prisoner(prisoner_id, target).await
            })
        })
        .collect();

    for handle in handles {
        let moved = handle.await.unwrap().unwrap();
        assert!(moved.cell_id == Some(a.id) || moved.cell_id == Some(b.id));
    }
    assert_eq!(occupancy(&pool, "A-101").await, 20);
    assert_eq!(occupancy(&pool, "B-101").await, 20);
    assert!(office.occupancy.find_drift().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_deadlock_victim_is_conflict(pool: PgPool) {
    let a = common::cell(&pool, "A-101", 1).await;
    let b = common::cell(&pool, "B-101", 1).await;

    let mut first = pool.begin().await.unwrap();
    let mut second = pool.begin().await.unwrap();
    CellRepo::lock_many(&mut *first, &[a.id]).await.unwrap();
    CellRepo::lock_many(&mut *second, &[b.id]).await.unwrap();

    // Each side now waits on the row the other holds.
    let (b_ids, a_ids) = ([b.id], [a.id]);
    let (left, right) = tokio::join!(
        CellRepo::lock_many(&mut *first, &b_ids),
        CellRepo::lock_many(&mut *second, &a_ids),
    );
    let err = left.err().or(right.err()).expect("one side is aborted");
    assert_matches!(ServiceError::from(err).kind(), ErrorKind::Conflict);
}
