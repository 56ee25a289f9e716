//! Shopper reservation rows.

use chrono::NaiveDate;
use pantry_core::booking::{Booking, BookingKind, SlotRef, Subject};
use pantry_core::error::BookingError;
use pantry_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::{booking_status_for, StatusId};

/// A row from the `reservations` table.
///
/// Exactly one of `client_id` / `new_client_id` is set (enforced by a
/// CHECK constraint).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationRow {
    pub id: DbId,
    pub client_id: Option<DbId>,
    pub new_client_id: Option<DbId>,
    pub slot_id: DbId,
    pub date: NaiveDate,
    pub status_id: StatusId,
    pub note: Option<String>,
    pub staff_note: Option<String>,
    pub reason: Option<String>,
    pub reschedule_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ReservationRow> for Booking {
    type Error = BookingError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let subject = match (row.client_id, row.new_client_id) {
            (Some(id), None) => Subject::Client(id),
            (None, Some(id)) => Subject::NewClient(id),
            _ => {
                return Err(BookingError::Storage(format!(
                    "reservation {} must reference exactly one client",
                    row.id
                )))
            }
        };
        let status = booking_status_for(BookingKind::Shopper, row.status_id).ok_or_else(|| {
            BookingError::Storage(format!(
                "reservation {} has unknown status {}",
                row.id, row.status_id
            ))
        })?;
        Ok(Booking {
            id: row.id,
            subject,
            target: SlotRef::Shopper(row.slot_id),
            date: row.date,
            status,
            note: row.note,
            staff_note: row.staff_note,
            reason: row.reason,
            recurring_id: None,
            reschedule_token: row.reschedule_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pantry_core::status::BookingStatus;

    fn row() -> ReservationRow {
        ReservationRow {
            id: 5,
            client_id: None,
            new_client_id: Some(12),
            slot_id: 3,
            date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            status_id: 3,
            note: None,
            staff_note: None,
            reason: None,
            reschedule_token: "abc".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn walk_in_row_maps_to_new_client() {
        let booking = Booking::try_from(row()).unwrap();
        assert_eq!(booking.subject, Subject::NewClient(12));
        assert_eq!(booking.target, SlotRef::Shopper(3));
        assert_eq!(booking.status, BookingStatus::NoShow);
    }

    #[test]
    fn row_without_client_is_rejected() {
        let mut bad = row();
        bad.new_client_id = None;
        assert!(Booking::try_from(bad).is_err());
    }
}
