//! Repository for `volunteer_roles` and their shifts in `volunteer_slots`.

use pantry_core::types::DbId;
use sqlx::PgPool;

use crate::models::volunteer_role::{
    CreateVolunteerRole, CreateVolunteerShift, UpdateVolunteerShift, VolunteerRoleRow,
    VolunteerShiftRow,
};

const ROLE_COLUMNS: &str = "id, name, categories, created_at, updated_at";

const SHIFT_SELECT: &str = "SELECT s.id AS shift_id, r.id AS role_id, r.name AS role_name, \
     r.categories, s.start_time, s.end_time, s.max_volunteers, s.is_active \
     FROM volunteer_slots s JOIN volunteer_roles r ON r.id = s.role_id";

pub struct VolunteerRoleRepo;

impl VolunteerRoleRepo {
    pub async fn list_roles(pool: &PgPool) -> Result<Vec<VolunteerRoleRow>, sqlx::Error> {
        let query = format!("SELECT {ROLE_COLUMNS} FROM volunteer_roles ORDER BY name");
        sqlx::query_as::<_, VolunteerRoleRow>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn create_role(
        pool: &PgPool,
        input: &CreateVolunteerRole,
    ) -> Result<VolunteerRoleRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO volunteer_roles (name, categories)
             VALUES ($1, $2)
             RETURNING {ROLE_COLUMNS}"
        );
        sqlx::query_as::<_, VolunteerRoleRow>(&query)
            .bind(&input.name)
            .bind(&input.categories)
            .fetch_one(pool)
            .await
    }

    /// Shifts joined with their role, ordered by start time.
    pub async fn list_shifts(
        pool: &PgPool,
        active_only: bool,
    ) -> Result<Vec<VolunteerShiftRow>, sqlx::Error> {
        let query = format!(
            "{SHIFT_SELECT} WHERE ($1 = false OR s.is_active) ORDER BY s.start_time, r.id, s.id"
        );
        sqlx::query_as::<_, VolunteerShiftRow>(&query)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    pub async fn find_shift(
        pool: &PgPool,
        shift_id: DbId,
    ) -> Result<Option<VolunteerShiftRow>, sqlx::Error> {
        let query = format!("{SHIFT_SELECT} WHERE s.id = $1");
        sqlx::query_as::<_, VolunteerShiftRow>(&query)
            .bind(shift_id)
            .fetch_optional(pool)
            .await
    }

    /// Add a shift to a role and return it joined with the role.
    pub async fn create_shift(
        pool: &PgPool,
        role_id: DbId,
        input: &CreateVolunteerShift,
    ) -> Result<VolunteerShiftRow, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO volunteer_slots (role_id, start_time, end_time, max_volunteers)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(role_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.max_volunteers)
        .fetch_one(pool)
        .await?;

        Self::find_shift(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Update a shift. Only non-`None` fields in `input` are applied.
    pub async fn update_shift(
        pool: &PgPool,
        shift_id: DbId,
        input: &UpdateVolunteerShift,
    ) -> Result<Option<VolunteerShiftRow>, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE volunteer_slots SET
                start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                max_volunteers = COALESCE($4, max_volunteers),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(shift_id)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.max_volunteers)
        .bind(input.is_active)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_shift(pool, shift_id).await
    }
}
