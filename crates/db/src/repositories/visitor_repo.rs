//! Repository for the `visitors` table.

use cellblock_core::status::VisitorStatus;
use cellblock_core::types::{Date, DbId};
use sqlx::{PgExecutor, PgPool};

use crate::models::visitor::{CreateVisitor, UpdateVisitor, Visitor, VisitorCount, VisitorFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, prisoner_id, first_name, last_name, phone, id_document, \
                        relationship, visit_count, last_visit_date, status_id, \
                        created_at, updated_at";

/// Provides CRUD operations for visitors.
pub struct VisitorRepo;

impl VisitorRepo {
    /// Register a visitor. New visitors are Pending unless a status is given.
    pub async fn create(pool: &PgPool, input: &CreateVisitor) -> Result<Visitor, sqlx::Error> {
        let query = format!(
            "INSERT INTO visitors
                (prisoner_id, first_name, last_name, phone, id_document, relationship, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, $8))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visitor>(&query)
            .bind(input.prisoner_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(&input.id_document)
            .bind(&input.relationship)
            .bind(input.status_id)
            .bind(VisitorStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a visitor by internal ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Visitor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM visitors WHERE id = $1");
        sqlx::query_as::<_, Visitor>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Visitors registered for a prisoner, ordered by name.
    pub async fn list_for_prisoner(
        pool: &PgPool,
        prisoner_id: DbId,
    ) -> Result<Vec<Visitor>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visitors
             WHERE prisoner_id = $1
             ORDER BY last_name ASC, first_name ASC"
        );
        sqlx::query_as::<_, Visitor>(&query)
            .bind(prisoner_id)
            .fetch_all(pool)
            .await
    }

    /// List visitors matching every provided filter field.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &VisitorFilter,
    ) -> Result<Vec<Visitor>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM visitors
             WHERE ($1::BIGINT IS NULL OR prisoner_id = $1)
               AND ($2::SMALLINT IS NULL OR status_id = $2)
               AND ($3::TEXT IS NULL
                    OR first_name ILIKE '%' || $3 || '%'
                    OR last_name ILIKE '%' || $3 || '%')
             ORDER BY last_name ASC, first_name ASC"
        );
        sqlx::query_as::<_, Visitor>(&query)
            .bind(filter.prisoner_id)
            .bind(filter.status_id)
            .bind(&filter.search)
            .fetch_all(pool)
            .await
    }

    /// Update a visitor. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateVisitor,
    ) -> Result<Option<Visitor>, sqlx::Error> {
        let query = format!(
            "UPDATE visitors SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                id_document = COALESCE($5, id_document),
                relationship = COALESCE($6, relationship),
                status_id = COALESCE($7, status_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visitor>(&query)
            .bind(id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.phone)
            .bind(&input.id_document)
            .bind(&input.relationship)
            .bind(input.status_id)
            .fetch_optional(pool)
            .await
    }

    /// Count one completed visit against the visitor.
    pub async fn record_visit<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        visit_date: Date,
    ) -> Result<Option<Visitor>, sqlx::Error> {
        let query = format!(
            "UPDATE visitors SET
                visit_count = visit_count + 1,
                last_visit_date = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Visitor>(&query)
            .bind(id)
            .bind(visit_date)
            .fetch_optional(executor)
            .await
    }

    /// Delete a visitor. Their visits cascade.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Registered visitor count per prisoner, busiest first.
    pub async fn count_per_prisoner(pool: &PgPool) -> Result<Vec<VisitorCount>, sqlx::Error> {
        sqlx::query_as::<_, VisitorCount>(
            "SELECT prisoner_id, COUNT(*) AS count FROM visitors
             GROUP BY prisoner_id
             ORDER BY count DESC, prisoner_id ASC",
        )
        .fetch_all(pool)
        .await
    }
}
