//! Booking records shared by the ledger, the engine and persistence.
//!
//! Shopper reservations and volunteer bookings live in separate tables but
//! share one in-memory shape, discriminated by [`BookingKind`].

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::status::BookingStatus;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Kinds, subjects and targets
// ---------------------------------------------------------------------------

/// Which ledger a booking belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    /// Pantry shopping appointment against a [`Slot`](crate::catalog::Slot).
    Shopper,
    /// Volunteer shift booking against a
    /// [`VolunteerRoleShift`](crate::catalog::VolunteerRoleShift).
    Volunteer,
}

impl BookingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingKind::Shopper => "shopper",
            BookingKind::Volunteer => "volunteer",
        }
    }
}

impl fmt::Display for BookingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person a booking is held for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    /// A registered pantry client.
    Client(DbId),
    /// A walk-in not yet registered; refers to a `new_clients` row.
    NewClient(DbId),
    Volunteer(DbId),
}

impl Subject {
    /// The ledger this subject books into.
    pub fn kind(self) -> BookingKind {
        match self {
            Subject::Client(_) | Subject::NewClient(_) => BookingKind::Shopper,
            Subject::Volunteer(_) => BookingKind::Volunteer,
        }
    }

    pub fn id(self) -> DbId {
        match self {
            Subject::Client(id) | Subject::NewClient(id) | Subject::Volunteer(id) => id,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Client(id) => write!(f, "client:{id}"),
            Subject::NewClient(id) => write!(f, "new_client:{id}"),
            Subject::Volunteer(id) => write!(f, "volunteer:{id}"),
        }
    }
}

/// A capacity bucket: a shopper slot or a volunteer shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum SlotRef {
    Shopper(DbId),
    Shift(DbId),
}

impl SlotRef {
    pub fn kind(self) -> BookingKind {
        match self {
            SlotRef::Shopper(_) => BookingKind::Shopper,
            SlotRef::Shift(_) => BookingKind::Volunteer,
        }
    }

    pub fn id(self) -> DbId {
        match self {
            SlotRef::Shopper(id) | SlotRef::Shift(id) => id,
        }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRef::Shopper(id) => write!(f, "slot:{id}"),
            SlotRef::Shift(id) => write!(f, "shift:{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Booking row
// ---------------------------------------------------------------------------

/// A reservation (shopper) or volunteer booking as held by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: DbId,
    pub subject: Subject,
    pub target: SlotRef,
    pub date: NaiveDate,
    pub status: BookingStatus,
    /// Free text supplied by the person booking.
    pub note: Option<String>,
    /// Staff-only annotation.
    pub staff_note: Option<String>,
    /// Reason recorded with the last status transition (cancel, reject, no-show).
    pub reason: Option<String>,
    pub recurring_id: Option<DbId>,
    pub reschedule_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    pub fn kind(&self) -> BookingKind {
        self.target.kind()
    }

    /// Whether this booking still holds a live claim (pending or approved).
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Addresses one booking either by id or by its reschedule token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingHandle {
    Id(BookingKind, DbId),
    Token(String),
}

impl fmt::Display for BookingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingHandle::Id(kind, id) => write!(f, "{kind}:{id}"),
            // Tokens are capabilities; never print them in full.
            BookingHandle::Token(token) => {
                write!(f, "token:{}…", token.chars().take(6).collect::<String>())
            }
        }
    }
}

/// Who is placing a booking. Staff-assigned volunteer bookings skip review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookedBy {
    #[default]
    SelfService,
    Agency,
    Staff,
}

/// A request to claim one seat, as presented to the Conflict Resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub subject: Subject,
    pub target: SlotRef,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub booked_by: BookedBy,
}

/// A request after catalog resolution: carries the time range being claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub request: BookingRequest,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

// ---------------------------------------------------------------------------
// Outcomes and recurring series
// ---------------------------------------------------------------------------

/// Staff-recorded outcome of an approved booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Client shopped / volunteer worked the shift.
    Visited,
    NoShow,
}

impl Outcome {
    /// Terminal status this outcome maps to for the given ledger.
    pub fn status_for(self, kind: BookingKind) -> BookingStatus {
        match (self, kind) {
            (Outcome::Visited, BookingKind::Shopper) => BookingStatus::Visited,
            (Outcome::Visited, BookingKind::Volunteer) => BookingStatus::Completed,
            (Outcome::NoShow, _) => BookingStatus::NoShow,
        }
    }
}

/// Staff decision on a pending volunteer booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Recurrence frequency for a volunteer series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

/// A row from the `volunteer_recurring_bookings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub id: DbId,
    pub volunteer_id: DbId,
    pub shift_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    /// Weekday numbers, `0 = Sunday .. 6 = Saturday`. Empty for daily series.
    pub weekdays: Vec<u8>,
    pub created_at: Timestamp,
}

/// Insert payload for a new series.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSeries {
    pub volunteer_id: DbId,
    pub shift_id: DbId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub frequency: Frequency,
    pub weekdays: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_kind_follows_ledger() {
        assert_eq!(Subject::Client(1).kind(), BookingKind::Shopper);
        assert_eq!(Subject::NewClient(1).kind(), BookingKind::Shopper);
        assert_eq!(Subject::Volunteer(1).kind(), BookingKind::Volunteer);
    }

    #[test]
    fn kinds_order_as_map_keys() {
        let mut keys = vec![(BookingKind::Volunteer, 1), (BookingKind::Shopper, 2)];
        keys.sort();
        assert_eq!(keys, vec![(BookingKind::Shopper, 2), (BookingKind::Volunteer, 1)]);
    }

    #[test]
    fn visited_maps_to_completed_for_volunteers() {
        assert_eq!(
            Outcome::Visited.status_for(BookingKind::Volunteer),
            BookingStatus::Completed
        );
        assert_eq!(
            Outcome::Visited.status_for(BookingKind::Shopper),
            BookingStatus::Visited
        );
        assert_eq!(
            Outcome::NoShow.status_for(BookingKind::Volunteer),
            BookingStatus::NoShow
        );
    }

    #[test]
    fn token_handle_display_is_truncated() {
        let handle = BookingHandle::Token("abcdefghijklmnop".into());
        assert_eq!(handle.to_string(), "token:abcdef…");
    }

    #[test]
    fn subject_serializes_tagged() {
        let json = serde_json::to_value(Subject::Volunteer(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "volunteer", "id": 7 }));
    }
}
