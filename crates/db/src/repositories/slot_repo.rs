//! Repository for the `slots` table.

use pantry_core::types::DbId;
use sqlx::PgPool;

use crate::models::slot::{CreateSlot, SlotRow, UpdateSlot};

const COLUMNS: &str = "id, start_time, end_time, max_capacity, created_at, updated_at";

/// Provides CRUD operations for shopper slots.
pub struct SlotRepo;

impl SlotRepo {
    /// All slots ordered by start time.
    pub async fn list(pool: &PgPool) -> Result<Vec<SlotRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots ORDER BY start_time, id");
        sqlx::query_as::<_, SlotRow>(&query).fetch_all(pool).await
    }

    pub async fn create(pool: &PgPool, input: &CreateSlot) -> Result<SlotRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO slots (start_time, end_time, max_capacity)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_capacity)
            .fetch_one(pool)
            .await
    }

    /// Update a slot. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateSlot,
    ) -> Result<Option<SlotRow>, sqlx::Error> {
        let query = format!(
            "UPDATE slots SET
                start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                max_capacity = COALESCE($4, max_capacity),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SlotRow>(&query)
            .bind(id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(input.max_capacity)
            .fetch_optional(pool)
            .await
    }

    /// Delete a slot. Fails with a foreign-key violation while reservations
    /// still reference it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM slots WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
