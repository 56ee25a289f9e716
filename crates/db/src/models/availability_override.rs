//! Holidays, blocked slots, recurring blocks and breaks.

use chrono::NaiveDate;
use pantry_core::catalog::AvailabilityOverride;
use pantry_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `holidays` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HolidayRow {
    pub id: DbId,
    pub date: NaiveDate,
    pub reason: String,
}

/// A row from the `blocked_slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BlockedSlotRow {
    pub id: DbId,
    pub date: NaiveDate,
    pub slot_id: DbId,
    pub reason: String,
}

/// A row from the `recurring_blocked_slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecurringBlockedSlotRow {
    pub id: DbId,
    pub day_of_week: i16,
    pub week_of_month: i16,
    pub slot_id: DbId,
    pub reason: String,
}

/// A row from the `breaks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BreakRow {
    pub id: DbId,
    pub day_of_week: i16,
    pub slot_id: DbId,
    pub reason: String,
}

impl From<HolidayRow> for AvailabilityOverride {
    fn from(row: HolidayRow) -> Self {
        AvailabilityOverride::Holiday {
            date: row.date,
            reason: row.reason,
        }
    }
}

impl From<BlockedSlotRow> for AvailabilityOverride {
    fn from(row: BlockedSlotRow) -> Self {
        AvailabilityOverride::BlockedSlot {
            date: row.date,
            slot_id: row.slot_id,
            reason: row.reason,
        }
    }
}

impl From<RecurringBlockedSlotRow> for AvailabilityOverride {
    fn from(row: RecurringBlockedSlotRow) -> Self {
        AvailabilityOverride::RecurringBlockedSlot {
            day_of_week: row.day_of_week as u8,
            week_of_month: row.week_of_month as u8,
            slot_id: row.slot_id,
            reason: row.reason,
        }
    }
}

impl From<BreakRow> for AvailabilityOverride {
    fn from(row: BreakRow) -> Self {
        AvailabilityOverride::Break {
            day_of_week: row.day_of_week as u8,
            slot_id: row.slot_id,
            reason: row.reason,
        }
    }
}
