//! Repository for `holidays`, `blocked_slots`, `recurring_blocked_slots`
//! and `breaks`.

use pantry_core::catalog::AvailabilityOverride;
use pantry_core::types::DbId;
use sqlx::PgPool;

use crate::models::availability_override::{
    BlockedSlotRow, BreakRow, HolidayRow, RecurringBlockedSlotRow,
};

/// Tables that hold one kind of override each.
const OVERRIDE_TABLES: &[&str] = &["holidays", "blocked_slots", "recurring_blocked_slots", "breaks"];

pub struct AvailabilityOverrideRepo;

impl AvailabilityOverrideRepo {
    /// Every override, mapped into the catalog's shape.
    pub async fn load_all(pool: &PgPool) -> Result<Vec<AvailabilityOverride>, sqlx::Error> {
        let mut overrides: Vec<AvailabilityOverride> = Vec::new();
        overrides.extend(Self::list_holidays(pool).await?.into_iter().map(Into::into));
        overrides.extend(Self::list_blocked_slots(pool).await?.into_iter().map(Into::into));
        overrides.extend(
            Self::list_recurring_blocked_slots(pool)
                .await?
                .into_iter()
                .map(Into::into),
        );
        overrides.extend(Self::list_breaks(pool).await?.into_iter().map(Into::into));
        Ok(overrides)
    }

    pub async fn list_holidays(pool: &PgPool) -> Result<Vec<HolidayRow>, sqlx::Error> {
        sqlx::query_as::<_, HolidayRow>("SELECT id, date, reason FROM holidays ORDER BY date")
            .fetch_all(pool)
            .await
    }

    pub async fn list_blocked_slots(pool: &PgPool) -> Result<Vec<BlockedSlotRow>, sqlx::Error> {
        sqlx::query_as::<_, BlockedSlotRow>(
            "SELECT id, date, slot_id, reason FROM blocked_slots ORDER BY date, slot_id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_recurring_blocked_slots(
        pool: &PgPool,
    ) -> Result<Vec<RecurringBlockedSlotRow>, sqlx::Error> {
        sqlx::query_as::<_, RecurringBlockedSlotRow>(
            "SELECT id, day_of_week, week_of_month, slot_id, reason \
             FROM recurring_blocked_slots ORDER BY day_of_week, week_of_month, slot_id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_breaks(pool: &PgPool) -> Result<Vec<BreakRow>, sqlx::Error> {
        sqlx::query_as::<_, BreakRow>(
            "SELECT id, day_of_week, slot_id, reason FROM breaks ORDER BY day_of_week, slot_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Insert any override kind, returning the new row id.
    pub async fn create(pool: &PgPool, input: &AvailabilityOverride) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = match input {
            AvailabilityOverride::Holiday { date, reason } => {
                sqlx::query_as("INSERT INTO holidays (date, reason) VALUES ($1, $2) RETURNING id")
                    .bind(date)
                    .bind(reason)
                    .fetch_one(pool)
                    .await?
            }
            AvailabilityOverride::BlockedSlot {
                date,
                slot_id,
                reason,
            } => {
                sqlx::query_as(
                    "INSERT INTO blocked_slots (date, slot_id, reason) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(date)
                .bind(slot_id)
                .bind(reason)
                .fetch_one(pool)
                .await?
            }
            AvailabilityOverride::RecurringBlockedSlot {
                day_of_week,
                week_of_month,
                slot_id,
                reason,
            } => {
                sqlx::query_as(
                    "INSERT INTO recurring_blocked_slots (day_of_week, week_of_month, slot_id, reason) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(*day_of_week as i16)
                .bind(*week_of_month as i16)
                .bind(slot_id)
                .bind(reason)
                .fetch_one(pool)
                .await?
            }
            AvailabilityOverride::Break {
                day_of_week,
                slot_id,
                reason,
            } => {
                sqlx::query_as(
                    "INSERT INTO breaks (day_of_week, slot_id, reason) \
                     VALUES ($1, $2, $3) RETURNING id",
                )
                .bind(*day_of_week as i16)
                .bind(slot_id)
                .bind(reason)
                .fetch_one(pool)
                .await?
            }
        };
        Ok(id)
    }

    /// Delete one override row from `table`. Returns `true` if a row was
    /// removed; unknown table names remove nothing.
    pub async fn delete(pool: &PgPool, table: &str, id: DbId) -> Result<bool, sqlx::Error> {
        let Some(table) = OVERRIDE_TABLES.iter().find(|t| **t == table) else {
            return Ok(false);
        };
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
