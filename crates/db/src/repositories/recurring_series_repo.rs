//! Repository for the `volunteer_recurring_bookings` table.

use pantry_core::booking::NewSeries;
use pantry_core::types::DbId;
use sqlx::PgPool;

use crate::models::recurring_series::RecurringSeriesRow;

const COLUMNS: &str =
    "id, volunteer_id, slot_id, start_date, end_date, pattern, days_of_week, created_at";

pub struct RecurringSeriesRepo;

impl RecurringSeriesRepo {
    pub async fn create(pool: &PgPool, input: &NewSeries) -> Result<RecurringSeriesRow, sqlx::Error> {
        let days: Vec<i16> = input.weekdays.iter().map(|d| *d as i16).collect();
        let query = format!(
            "INSERT INTO volunteer_recurring_bookings
                (volunteer_id, slot_id, start_date, end_date, pattern, days_of_week)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecurringSeriesRow>(&query)
            .bind(input.volunteer_id)
            .bind(input.shift_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.frequency.as_str())
            .bind(&days)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RecurringSeriesRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM volunteer_recurring_bookings WHERE id = $1");
        sqlx::query_as::<_, RecurringSeriesRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
