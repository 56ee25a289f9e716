//! Volunteer booking rows.

use chrono::NaiveDate;
use pantry_core::booking::{Booking, BookingKind, SlotRef, Subject};
use pantry_core::error::BookingError;
use pantry_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::{booking_status_for, StatusId};

/// A row from the `volunteer_bookings` table. `slot_id` is the shift.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VolunteerBookingRow {
    pub id: DbId,
    pub volunteer_id: DbId,
    pub slot_id: DbId,
    pub date: NaiveDate,
    pub status_id: StatusId,
    pub note: Option<String>,
    pub staff_note: Option<String>,
    pub reason: Option<String>,
    pub recurring_id: Option<DbId>,
    pub reschedule_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<VolunteerBookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: VolunteerBookingRow) -> Result<Self, Self::Error> {
        let status =
            booking_status_for(BookingKind::Volunteer, row.status_id).ok_or_else(|| {
                BookingError::Storage(format!(
                    "volunteer booking {} has unknown status {}",
                    row.id, row.status_id
                ))
            })?;
        Ok(Booking {
            id: row.id,
            subject: Subject::Volunteer(row.volunteer_id),
            target: SlotRef::Shift(row.slot_id),
            date: row.date,
            status,
            note: row.note,
            staff_note: row.staff_note,
            reason: row.reason,
            recurring_id: row.recurring_id,
            reschedule_token: row.reschedule_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
