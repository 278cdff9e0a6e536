//! Repository for the `emergency_procedures` table.

use cellblock_core::types::DbId;
use sqlx::PgPool;

use crate::models::emergency_procedure::{
    CreateEmergencyProcedure, EmergencyProcedure, UpdateEmergencyProcedure,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, procedure_type, description, steps, responsible_role_id, \
                        is_active, last_reviewed_on, created_at, updated_at";

/// Provides CRUD operations for emergency procedures.
pub struct EmergencyProcedureRepo;

impl EmergencyProcedureRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateEmergencyProcedure,
    ) -> Result<EmergencyProcedure, sqlx::Error> {
        let query = format!(
            "INSERT INTO emergency_procedures
                (title, procedure_type, description, steps, responsible_role_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmergencyProcedure>(&query)
            .bind(&input.title)
            .bind(&input.procedure_type)
            .bind(&input.description)
            .bind(&input.steps)
            .bind(input.responsible_role_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EmergencyProcedure>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM emergency_procedures WHERE id = $1");
        sqlx::query_as::<_, EmergencyProcedure>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active procedures, optionally restricted to one type.
    pub async fn list_active(
        pool: &PgPool,
        procedure_type: Option<&str>,
    ) -> Result<Vec<EmergencyProcedure>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM emergency_procedures
             WHERE is_active = TRUE
               AND ($1::TEXT IS NULL OR procedure_type = $1)
             ORDER BY procedure_type ASC, title ASC"
        );
        sqlx::query_as::<_, EmergencyProcedure>(&query)
            .bind(procedure_type)
            .fetch_all(pool)
            .await
    }

    /// Update a procedure. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEmergencyProcedure,
    ) -> Result<Option<EmergencyProcedure>, sqlx::Error> {
        let query = format!(
            "UPDATE emergency_procedures SET
                title = COALESCE($2, title),
                procedure_type = COALESCE($3, procedure_type),
                description = COALESCE($4, description),
                steps = COALESCE($5, steps),
                responsible_role_id = COALESCE($6, responsible_role_id),
                is_active = COALESCE($7, is_active),
                last_reviewed_on = COALESCE($8, last_reviewed_on)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EmergencyProcedure>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.procedure_type)
            .bind(&input.description)
            .bind(&input.steps)
            .bind(input.responsible_role_id)
            .bind(input.is_active)
            .bind(input.last_reviewed_on)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM emergency_procedures WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
