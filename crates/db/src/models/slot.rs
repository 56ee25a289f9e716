//! Shopper slot model and DTOs.

use chrono::NaiveTime;
use pantry_core::catalog::Slot;
use pantry_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotRow {
    pub id: DbId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_capacity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<SlotRow> for Slot {
    fn from(row: SlotRow) -> Self {
        Slot {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.max_capacity,
        }
    }
}

/// DTO for creating a new slot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_capacity: i32,
}

/// DTO for updating a slot. All fields are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSlot {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub max_capacity: Option<i32>,
}
