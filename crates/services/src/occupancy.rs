//! Cell occupancy bookkeeping.
//!
//! `current_occupancy` on a cell counts the in-custody prisoners assigned to
//! it and always stays within `0..=capacity`. Every bed is taken or freed by
//! a single conditional `UPDATE`, and every operation that also moves a
//! prisoner row runs both writes in one transaction.

use cellblock_core::error::CoreError;
use cellblock_core::status::{cell_status_for, CellStatus, PrisonerStatus};
use cellblock_core::types::{Date, DbId};
use cellblock_db::models::cell::{Cell, CreateCell, OccupancyDrift, OccupancySummary};
use cellblock_db::models::prisoner::{CreatePrisoner, Prisoner};
use cellblock_db::repositories::{CellRepo, PrisonerRepo};
use cellblock_db::DbPool;
use sqlx::PgConnection;
use validator::Validate;

use crate::error::ServiceResult;

/// Keeps cell occupancy consistent with prisoner assignments.
#[derive(Clone)]
pub struct OccupancyTracker {
    pool: DbPool,
}

impl OccupancyTracker {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Validate and create a cell. New cells are empty and Vacant.
    pub async fn register_cell(&self, input: &CreateCell) -> ServiceResult<Cell> {
        input.validate()?;
        let cell = CellRepo::create(&self.pool, input).await?;
        tracing::info!(
            cell_id = cell.id,
            cell_number = %cell.cell_number,
            capacity = cell.capacity,
            "Cell registered"
        );
        Ok(cell)
    }

    /// Take one bed in the cell.
    ///
    /// Fails with `Conflict` when the cell is full or under maintenance, and
    /// with `NotFound` when it does not exist; occupancy is unchanged then.
    pub async fn increment_occupancy(&self, cell_number: &str) -> ServiceResult<Cell> {
        let mut conn = self.pool.acquire().await?;
        reserve_bed(&mut conn, cell_number).await
    }

    /// Free one bed in the cell. Fails with `Conflict` on an empty cell.
    pub async fn decrement_occupancy(&self, cell_number: &str) -> ServiceResult<Cell> {
        let mut conn = self.pool.acquire().await?;
        free_bed(&mut conn, cell_number).await
    }

    /// Whether the cell can take another prisoner right now.
    pub async fn has_available_space(&self, cell_number: &str) -> ServiceResult<bool> {
        let cell = CellRepo::find_by_number(&self.pool, cell_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
        let open = cell.status_id != CellStatus::UnderMaintenance.id();
        Ok(open && cell.has_available_space())
    }

    /// Close a cell for maintenance or reopen it.
    ///
    /// Housed prisoners stay where they are; a closed cell only stops taking
    /// new ones. Reopening derives Occupied or Vacant from the occupancy.
    pub async fn set_maintenance(
        &self,
        cell_number: &str,
        under_maintenance: bool,
    ) -> ServiceResult<Cell> {
        let mut tx = self.pool.begin().await?;
        let cell = CellRepo::lock_by_number(&mut *tx, cell_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
        let updated = CellRepo::set_maintenance(&mut *tx, cell.id, under_maintenance)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
        tx.commit().await?;

        tracing::info!(
            cell_number,
            under_maintenance,
            occupancy = updated.current_occupancy,
            "Cell maintenance status changed"
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Prisoner movements
    // -----------------------------------------------------------------------

    /// Admit a prisoner into a cell, reserving the bed in the same transaction.
    pub async fn admit_prisoner(
        &self,
        input: &CreatePrisoner,
        cell_number: &str,
    ) -> ServiceResult<Prisoner> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let cell = reserve_bed(&mut tx, cell_number).await?;
        let prisoner = PrisonerRepo::create(&mut *tx, input, Some(cell.id)).await?;
        tx.commit().await?;

        tracing::info!(
            prisoner_id = prisoner.id,
            prisoner_number = %prisoner.prisoner_number,
            cell_number,
            occupancy = cell.current_occupancy,
            "Prisoner admitted"
        );
        Ok(prisoner)
    }

    /// Move an in-custody prisoner to another cell.
    ///
    /// Transferring into the prisoner's current cell is a no-op.
    pub async fn transfer_prisoner(
        &self,
        prisoner_id: DbId,
        cell_number: &str,
    ) -> ServiceResult<Prisoner> {
        let mut tx = self.pool.begin().await?;

        let prisoner = lock_in_custody(&mut tx, prisoner_id).await?;
        let target = CellRepo::find_by_number(&mut *tx, cell_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;

        if prisoner.cell_id == Some(target.id) {
            tracing::debug!(prisoner_id, cell_number, "Prisoner already in target cell");
            return Ok(prisoner);
        }

        let mut cell_ids = vec![target.id];
        cell_ids.extend(prisoner.cell_id);
        CellRepo::lock_many(&mut *tx, &cell_ids).await?;

        reserve_bed(&mut tx, cell_number).await?;
        if let Some(source_id) = prisoner.cell_id {
            free_bed_by_id(&mut tx, source_id).await?;
        }
        let moved = PrisonerRepo::set_cell(&mut *tx, prisoner_id, Some(target.id))
            .await?
            .ok_or_else(|| CoreError::not_found("Prisoner", prisoner_id))?;
        tx.commit().await?;

        tracing::info!(
            prisoner_id,
            from_cell_id = ?prisoner.cell_id,
            to_cell = cell_number,
            "Prisoner transferred"
        );
        Ok(moved)
    }

    /// Release a prisoner from custody and free their bed.
    pub async fn release_prisoner(
        &self,
        prisoner_id: DbId,
        release_date: Date,
    ) -> ServiceResult<Prisoner> {
        self.depart(prisoner_id, PrisonerStatus::Released, release_date)
            .await
    }

    /// Record a transfer to another facility and free the prisoner's bed.
    pub async fn transfer_out(
        &self,
        prisoner_id: DbId,
        departure_date: Date,
    ) -> ServiceResult<Prisoner> {
        self.depart(prisoner_id, PrisonerStatus::Transferred, departure_date)
            .await
    }

    async fn depart(
        &self,
        prisoner_id: DbId,
        status: PrisonerStatus,
        date: Date,
    ) -> ServiceResult<Prisoner> {
        let mut tx = self.pool.begin().await?;

        let prisoner = lock_in_custody(&mut tx, prisoner_id).await?;
        let departed = PrisonerRepo::mark_departed(&mut *tx, prisoner_id, status, date)
            .await?
            .ok_or_else(|| CoreError::not_found("Prisoner", prisoner_id))?;
        if let Some(cell_id) = prisoner.cell_id {
            free_bed_by_id(&mut tx, cell_id).await?;
        }
        tx.commit().await?;

        tracing::info!(prisoner_id, %status, %date, "Prisoner left custody");
        Ok(departed)
    }

    /// Delete a prisoner record, freeing the bed if they were still housed.
    ///
    /// Visitors and visits for the prisoner are removed with it.
    pub async fn purge_prisoner(&self, prisoner_id: DbId) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let prisoner = PrisonerRepo::lock_by_id(&mut *tx, prisoner_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Prisoner", prisoner_id))?;
        PrisonerRepo::delete(&mut *tx, prisoner_id).await?;
        if prisoner.status_id == PrisonerStatus::InCustody.id() {
            if let Some(cell_id) = prisoner.cell_id {
                free_bed_by_id(&mut tx, cell_id).await?;
            }
        }
        tx.commit().await?;

        tracing::info!(
            prisoner_id,
            prisoner_number = %prisoner.prisoner_number,
            "Prisoner record purged"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    /// Recount the cell's occupancy from its in-custody prisoners.
    pub async fn reconcile(&self, cell_number: &str) -> ServiceResult<Cell> {
        let mut tx = self.pool.begin().await?;

        let cell = CellRepo::lock_by_number(&mut *tx, cell_number)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
        let actual = PrisonerRepo::count_in_cell(&mut *tx, cell.id).await?;
        let actual = i32::try_from(actual)
            .ok()
            .filter(|n| *n <= cell.capacity)
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Cell {cell_number} houses {actual} prisoners but holds only {}",
                    cell.capacity
                ))
            })?;

        let status = cell_status_for(CellStatus::try_from(cell.status_id)?, actual);
        let updated = CellRepo::set_occupancy(&mut *tx, cell.id, actual, status)
            .await?
            .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
        tx.commit().await?;

        if cell.current_occupancy != actual {
            tracing::warn!(
                cell_number,
                stored = cell.current_occupancy,
                actual,
                "Cell occupancy corrected"
            );
        }
        Ok(updated)
    }

    /// Cells whose stored occupancy disagrees with their prisoner count.
    pub async fn find_drift(&self) -> ServiceResult<Vec<OccupancyDrift>> {
        let drift = CellRepo::find_drift(&self.pool).await?;
        for d in &drift {
            tracing::warn!(
                cell_number = %d.cell_number,
                stored = d.current_occupancy,
                actual = d.actual_occupancy,
                "Occupancy drift"
            );
        }
        Ok(drift)
    }

    pub async fn occupancy_summary(&self) -> ServiceResult<OccupancySummary> {
        Ok(CellRepo::occupancy_summary(&self.pool).await?)
    }
}

/// Lock a prisoner row, requiring the prisoner to be in custody.
async fn lock_in_custody(conn: &mut PgConnection, prisoner_id: DbId) -> ServiceResult<Prisoner> {
    let prisoner = PrisonerRepo::lock_by_id(&mut *conn, prisoner_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Prisoner", prisoner_id))?;
    if prisoner.status_id != PrisonerStatus::InCustody.id() {
        let status = PrisonerStatus::try_from(prisoner.status_id)?;
        return Err(CoreError::Conflict(format!(
            "Prisoner {} is {status}, not in custody",
            prisoner.prisoner_number
        ))
        .into());
    }
    Ok(prisoner)
}

async fn reserve_bed(conn: &mut PgConnection, cell_number: &str) -> ServiceResult<Cell> {
    if let Some(cell) = CellRepo::increment_occupancy(&mut *conn, cell_number).await? {
        tracing::debug!(cell_number, occupancy = cell.current_occupancy, "Bed reserved");
        return Ok(cell);
    }

    let cell = CellRepo::find_by_number(&mut *conn, cell_number)
        .await?
        .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
    let reason = if cell.status_id == CellStatus::UnderMaintenance.id() {
        format!("Cell {cell_number} is under maintenance")
    } else {
        format!(
            "Cell {cell_number} is full ({}/{})",
            cell.current_occupancy, cell.capacity
        )
    };
    tracing::warn!(cell_number, %reason, "Bed reservation rejected");
    Err(CoreError::Conflict(reason).into())
}

async fn free_bed(conn: &mut PgConnection, cell_number: &str) -> ServiceResult<Cell> {
    if let Some(cell) = CellRepo::decrement_occupancy(&mut *conn, cell_number).await? {
        tracing::debug!(cell_number, occupancy = cell.current_occupancy, "Bed freed");
        return Ok(cell);
    }

    CellRepo::find_by_number(&mut *conn, cell_number)
        .await?
        .ok_or_else(|| CoreError::not_found("Cell", cell_number))?;
    tracing::warn!(cell_number, "Bed release rejected: cell already empty");
    Err(CoreError::Conflict(format!("Cell {cell_number} is already empty")).into())
}

async fn free_bed_by_id(conn: &mut PgConnection, cell_id: DbId) -> ServiceResult<Cell> {
    let cell = CellRepo::find_by_id(&mut *conn, cell_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Cell", cell_id))?;
    free_bed(conn, &cell.cell_number).await
}
