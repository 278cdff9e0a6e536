//! Repository for the `cells` table.

use cellblock_core::status::{CellStatus, PrisonerStatus};
use cellblock_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::cell::{
    Cell, CellFilter, CreateCell, OccupancyDrift, OccupancySummary, UpdateCell,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, cell_number, block, cell_type, capacity, current_occupancy, \
                        security_level_id, status_id, created_at, updated_at";

/// Provides CRUD and occupancy operations for cells.
///
/// The occupancy methods are single conditional statements; callers in the
/// service layer run them inside transactions when a prisoner row changes
/// alongside.
pub struct CellRepo;

impl CellRepo {
    /// Insert a new cell with zero occupancy, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCell) -> Result<Cell, sqlx::Error> {
        let query = format!(
            "INSERT INTO cells (cell_number, block, cell_type, capacity, security_level_id, status_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(&input.cell_number)
            .bind(&input.block)
            .bind(&input.cell_type)
            .bind(input.capacity)
            .bind(input.security_level_id)
            .bind(CellStatus::Vacant.id())
            .fetch_one(pool)
            .await
    }

    /// Find a cell by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cells WHERE id = $1");
        sqlx::query_as::<_, Cell>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a cell by its number (e.g. `A-101`).
    pub async fn find_by_number<'e, E: PgExecutor<'e>>(
        executor: E,
        cell_number: &str,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cells WHERE cell_number = $1");
        sqlx::query_as::<_, Cell>(&query)
            .bind(cell_number)
            .fetch_optional(executor)
            .await
    }

    /// Find a cell by number and lock the row for the rest of the transaction.
    pub async fn lock_by_number<'e, E: PgExecutor<'e>>(
        executor: E,
        cell_number: &str,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cells WHERE cell_number = $1 FOR UPDATE");
        sqlx::query_as::<_, Cell>(&query)
            .bind(cell_number)
            .fetch_optional(executor)
            .await
    }

    /// Lock several cells in ascending id order.
    ///
    /// Transactions touching more than one cell lock through here first so
    /// that two of them always queue on the same row instead of deadlocking.
    pub async fn lock_many<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[DbId],
    ) -> Result<Vec<Cell>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cells WHERE id = ANY($1) ORDER BY id ASC FOR UPDATE"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    /// List all cells ordered by cell number.
    pub async fn list(pool: &PgPool) -> Result<Vec<Cell>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cells ORDER BY cell_number ASC");
        sqlx::query_as::<_, Cell>(&query).fetch_all(pool).await
    }

    /// List cells matching every provided filter field.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &CellFilter,
    ) -> Result<Vec<Cell>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cells
             WHERE ($1::TEXT IS NULL OR block = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
               AND ($3::SMALLINT IS NULL OR security_level_id = $3)
               AND ($4::BOOLEAN IS NULL OR (current_occupancy < capacity) = $4)
             ORDER BY cell_number ASC"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(&filter.block)
            .bind(filter.status_id)
            .bind(filter.security_level_id)
            .bind(filter.with_space)
            .fetch_all(pool)
            .await
    }

    /// Update a cell. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists. Shrinking the
    /// capacity below the current occupancy fails on `ck_cells_occupancy`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateCell,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!(
            "UPDATE cells SET
                block = COALESCE($2, block),
                cell_type = COALESCE($3, cell_type),
                capacity = COALESCE($4, capacity),
                security_level_id = COALESCE($5, security_level_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(id)
            .bind(&input.block)
            .bind(&input.cell_type)
            .bind(input.capacity)
            .bind(input.security_level_id)
            .fetch_optional(pool)
            .await
    }

    /// Put a cell under maintenance, or take it out again.
    ///
    /// Leaving maintenance restores Occupied or Vacant from the current
    /// occupancy. Returns `None` if no row with the given `id` exists.
    pub async fn set_maintenance<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        under_maintenance: bool,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!(
            "UPDATE cells SET
                status_id = CASE
                    WHEN $2 THEN $3
                    WHEN current_occupancy > 0 THEN $4
                    ELSE $5
                END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(id)
            .bind(under_maintenance)
            .bind(CellStatus::UnderMaintenance.id())
            .bind(CellStatus::Occupied.id())
            .bind(CellStatus::Vacant.id())
            .fetch_optional(executor)
            .await
    }

    /// Delete a cell. Prisoners referencing it have their cell cleared.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cells WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Occupancy
    // -----------------------------------------------------------------------

    /// Take one bed in the cell if it has space and is not under maintenance.
    ///
    /// Check and write happen in one statement, so concurrent callers cannot
    /// both pass the space check. Returns `None` when the cell does not exist,
    /// is full, or is under maintenance.
    pub async fn increment_occupancy<'e, E: PgExecutor<'e>>(
        executor: E,
        cell_number: &str,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!(
            "UPDATE cells SET
                current_occupancy = current_occupancy + 1,
                status_id = $2
             WHERE cell_number = $1
               AND current_occupancy < capacity
               AND status_id <> $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(cell_number)
            .bind(CellStatus::Occupied.id())
            .bind(CellStatus::UnderMaintenance.id())
            .fetch_optional(executor)
            .await
    }

    /// Free one bed in the cell. Returns `None` when the cell does not exist
    /// or is already empty.
    pub async fn decrement_occupancy<'e, E: PgExecutor<'e>>(
        executor: E,
        cell_number: &str,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!(
            "UPDATE cells SET
                current_occupancy = current_occupancy - 1,
                status_id = CASE
                    WHEN status_id = $2 THEN status_id
                    WHEN current_occupancy - 1 > 0 THEN $3
                    ELSE $4
                END
             WHERE cell_number = $1
               AND current_occupancy > 0
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(cell_number)
            .bind(CellStatus::UnderMaintenance.id())
            .bind(CellStatus::Occupied.id())
            .bind(CellStatus::Vacant.id())
            .fetch_optional(executor)
            .await
    }

    /// Overwrite the occupancy and status with recounted values.
    ///
    /// Values outside `0..=capacity` fail on `ck_cells_occupancy`.
    pub async fn set_occupancy<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        occupancy: i32,
        status: CellStatus,
    ) -> Result<Option<Cell>, sqlx::Error> {
        let query = format!(
            "UPDATE cells SET current_occupancy = $2, status_id = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Cell>(&query)
            .bind(id)
            .bind(occupancy)
            .bind(status.id())
            .fetch_optional(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Facility-wide capacity and occupancy totals.
    pub async fn occupancy_summary(pool: &PgPool) -> Result<OccupancySummary, sqlx::Error> {
        sqlx::query_as::<_, OccupancySummary>(
            "SELECT
                COUNT(*) AS total_cells,
                COALESCE(SUM(capacity), 0)::BIGINT AS total_capacity,
                COALESCE(SUM(current_occupancy), 0)::BIGINT AS total_occupancy,
                COUNT(*) FILTER (WHERE current_occupancy >= capacity) AS full_cells,
                COUNT(*) FILTER (WHERE current_occupancy = 0) AS vacant_cells
             FROM cells",
        )
        .fetch_one(pool)
        .await
    }

    /// Cells whose stored occupancy differs from the number of in-custody
    /// prisoners assigned to them.
    pub async fn find_drift(pool: &PgPool) -> Result<Vec<OccupancyDrift>, sqlx::Error> {
        sqlx::query_as::<_, OccupancyDrift>(
            "SELECT c.id AS cell_id, c.cell_number, c.current_occupancy,
                    COUNT(p.id) AS actual_occupancy
             FROM cells c
             LEFT JOIN prisoners p ON p.cell_id = c.id AND p.status_id = $1
             GROUP BY c.id, c.cell_number, c.current_occupancy
             HAVING c.current_occupancy <> COUNT(p.id)
             ORDER BY c.cell_number ASC",
        )
        .bind(PrisonerStatus::InCustody.id())
        .fetch_all(pool)
        .await
    }
}
