//! Repository for the `prisoners` table.

use cellblock_core::reference::{self, MAX_REFERENCE_ATTEMPTS};
use cellblock_core::status::PrisonerStatus;
use cellblock_core::types::{Date, DbId};
use sqlx::{Acquire, PgExecutor, PgPool, Postgres};

use crate::models::prisoner::{CreatePrisoner, Prisoner, PrisonerFilter, UpdatePrisoner};
use crate::models::stats::StatusCount;
use crate::unique;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, prisoner_number, first_name, last_name, date_of_birth, phone, \
                        crime_description, cell_id, sentence_months, status_id, \
                        admission_date, release_date, created_at, updated_at";

const NUMBER_CONSTRAINT: &str = "uq_prisoners_prisoner_number";

/// Provides CRUD operations for prisoners.
///
/// Cell assignment and release are exposed as executor-generic methods so
/// the occupancy tracker can pair them with cell updates in one transaction.
pub struct PrisonerRepo;

impl PrisonerRepo {
    /// Insert a new in-custody prisoner with a generated prisoner number.
    pub async fn create<'a, A>(
        conn: A,
        input: &CreatePrisoner,
        cell_id: Option<DbId>,
    ) -> Result<Prisoner, unique::InsertError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let query = format!(
            "INSERT INTO prisoners
                (prisoner_number, first_name, last_name, date_of_birth, phone,
                 crime_description, cell_id, sentence_months, status_id, admission_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, CURRENT_DATE))
             ON CONFLICT ON CONSTRAINT {NUMBER_CONSTRAINT} DO NOTHING
             RETURNING {COLUMNS}"
        );

        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let number = reference::prisoner_number();
            let row = sqlx::query_as::<_, Prisoner>(&query)
                .bind(&number)
                .bind(&input.first_name)
                .bind(&input.last_name)
                .bind(input.date_of_birth)
                .bind(&input.phone)
                .bind(&input.crime_description)
                .bind(cell_id)
                .bind(input.sentence_months)
                .bind(PrisonerStatus::InCustody.id())
                .bind(input.admission_date)
                .fetch_optional(&mut *conn)
                .await?;
            match row {
                Some(prisoner) => return Ok(prisoner),
                None => unique::log_collision(NUMBER_CONSTRAINT, &number, attempt),
            }
        }
        Err(unique::codes_exhausted(NUMBER_CONSTRAINT))
    }

    /// Find a prisoner by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prisoners WHERE id = $1");
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a prisoner by ID and lock the row for the rest of the transaction.
    pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prisoners WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a prisoner by prisoner number (e.g. `PR482913`).
    pub async fn find_by_number(
        pool: &PgPool,
        prisoner_number: &str,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prisoners WHERE prisoner_number = $1");
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(prisoner_number)
            .fetch_optional(pool)
            .await
    }

    /// List all prisoners, most recently admitted first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Prisoner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prisoners ORDER BY admission_date DESC, id DESC"
        );
        sqlx::query_as::<_, Prisoner>(&query).fetch_all(pool).await
    }

    /// List prisoners matching every provided filter field.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &PrisonerFilter,
    ) -> Result<Vec<Prisoner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prisoners
             WHERE ($1::SMALLINT IS NULL OR status_id = $1)
               AND ($2::BIGINT IS NULL OR cell_id = $2)
               AND ($3::TEXT IS NULL
                    OR first_name ILIKE '%' || $3 || '%'
                    OR last_name ILIKE '%' || $3 || '%'
                    OR prisoner_number ILIKE '%' || $3 || '%')
               AND ($4::DATE IS NULL OR admission_date >= $4)
               AND ($5::DATE IS NULL OR admission_date <= $5)
             ORDER BY admission_date DESC, id DESC"
        );
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(filter.status_id)
            .bind(filter.cell_id)
            .bind(&filter.search)
            .bind(filter.admitted_from)
            .bind(filter.admitted_to)
            .fetch_all(pool)
            .await
    }

    /// List in-custody prisoners housed in a cell.
    pub async fn list_by_cell(pool: &PgPool, cell_id: DbId) -> Result<Vec<Prisoner>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prisoners
             WHERE cell_id = $1 AND status_id = $2
             ORDER BY last_name ASC, first_name ASC"
        );
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(cell_id)
            .bind(PrisonerStatus::InCustody.id())
            .fetch_all(pool)
            .await
    }

    /// Update personal and sentence details. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePrisoner,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!(
            "UPDATE prisoners SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                date_of_birth = COALESCE($4, date_of_birth),
                phone = COALESCE($5, phone),
                crime_description = COALESCE($6, crime_description),
                sentence_months = COALESCE($7, sentence_months)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.date_of_birth)
            .bind(&input.phone)
            .bind(&input.crime_description)
            .bind(input.sentence_months)
            .fetch_optional(pool)
            .await
    }

    /// Point a prisoner at a different cell.
    pub async fn set_cell<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        cell_id: Option<DbId>,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!(
            "UPDATE prisoners SET cell_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(id)
            .bind(cell_id)
            .fetch_optional(executor)
            .await
    }

    /// Mark a prisoner released (or transferred out), clearing the cell.
    pub async fn mark_departed<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        status: PrisonerStatus,
        release_date: Date,
    ) -> Result<Option<Prisoner>, sqlx::Error> {
        let query = format!(
            "UPDATE prisoners SET
                status_id = $2,
                release_date = $3,
                cell_id = NULL
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prisoner>(&query)
            .bind(id)
            .bind(status.id())
            .bind(release_date)
            .fetch_optional(executor)
            .await
    }

    /// Delete a prisoner. Visitors and visits cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prisoners WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of in-custody prisoners assigned to a cell.
    pub async fn count_in_cell<'e, E: PgExecutor<'e>>(
        executor: E,
        cell_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM prisoners WHERE cell_id = $1 AND status_id = $2",
        )
        .bind(cell_id)
        .bind(PrisonerStatus::InCustody.id())
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Prisoner counts grouped by custody status.
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status_id, COUNT(*) AS count FROM prisoners
             GROUP BY status_id ORDER BY status_id",
        )
        .fetch_all(pool)
        .await
    }
}
