//! Recurring volunteer series (`volunteer_recurring_bookings`).

use chrono::NaiveDate;
use pantry_core::booking::{Frequency, RecurringSeries};
use pantry_core::error::BookingError;
use pantry_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecurringSeriesRow {
    pub id: DbId,
    pub volunteer_id: DbId,
    pub slot_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `daily` or `weekly`.
    pub pattern: String,
    pub days_of_week: Vec<i16>,
    pub created_at: Timestamp,
}

impl TryFrom<RecurringSeriesRow> for RecurringSeries {
    type Error = BookingError;

    fn try_from(row: RecurringSeriesRow) -> Result<Self, Self::Error> {
        let frequency = match row.pattern.as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            other => {
                return Err(BookingError::Storage(format!(
                    "series {} has unknown pattern '{other}'",
                    row.id
                )))
            }
        };
        Ok(RecurringSeries {
            id: row.id,
            volunteer_id: row.volunteer_id,
            shift_id: row.slot_id,
            start_date: row.start_date,
            end_date: row.end_date,
            frequency,
            weekdays: row.days_of_week.iter().map(|d| *d as u8).collect(),
            created_at: row.created_at,
        })
    }
}
