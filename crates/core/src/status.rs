//! Booking status values and the per-ledger transition table.
//!
//! This module lives in `core` (zero internal deps) so the engine, the
//! Postgres store and the HTTP layer all validate transitions the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::booking::BookingKind;

/// Union of shopper and volunteer booking statuses.
///
/// Shopper reservations use `Approved`, `Cancelled`, `NoShow`, `Visited`,
/// `Expired`. Volunteer bookings use `Pending`, `Approved`, `Rejected`,
/// `Cancelled`, `NoShow`, `Completed`, `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    NoShow,
    Visited,
    Completed,
    Expired,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Visited => "visited",
            BookingStatus::Completed => "completed",
            BookingStatus::Expired => "expired",
        }
    }

    /// Only `pending` and `approved` accept further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Pending | BookingStatus::Approved)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses that count against a slot's seat limit.
///
/// A no-show still held the seat historically and never frees capacity
/// retroactively. Pending volunteer bookings are counted so that approval
/// can never push a shift over its limit.
pub fn occupying_statuses(kind: BookingKind) -> &'static [BookingStatus] {
    match kind {
        BookingKind::Shopper => &[
            BookingStatus::Approved,
            BookingStatus::Visited,
            BookingStatus::NoShow,
        ],
        BookingKind::Volunteer => &[
            BookingStatus::Pending,
            BookingStatus::Approved,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ],
    }
}

/// Whether a booking in `status` occupies a seat.
pub fn occupies_capacity(kind: BookingKind, status: BookingStatus) -> bool {
    occupying_statuses(kind).contains(&status)
}

/// Status a freshly claimed booking starts in.
pub fn initial_status(kind: BookingKind, staff_assigned: bool) -> BookingStatus {
    match kind {
        BookingKind::Shopper => BookingStatus::Approved,
        BookingKind::Volunteer if staff_assigned => BookingStatus::Approved,
        BookingKind::Volunteer => BookingStatus::Pending,
    }
}

pub mod state_machine {
    use super::BookingStatus::{self, *};
    use crate::booking::BookingKind;

    /// Returns the set of statuses reachable from `from` in the given ledger.
    ///
    /// Terminal states return an empty slice.
    pub fn valid_transitions(kind: BookingKind, from: BookingStatus) -> &'static [BookingStatus] {
        match (kind, from) {
            // Approved -> Cancelled, NoShow, Visited, Expired
            (BookingKind::Shopper, Approved) => &[Cancelled, NoShow, Visited, Expired],
            // Pending -> Approved, Rejected, Cancelled, Expired
            (BookingKind::Volunteer, Pending) => &[Approved, Rejected, Cancelled, Expired],
            // Approved -> Cancelled, NoShow, Completed
            (BookingKind::Volunteer, Approved) => &[Cancelled, NoShow, Completed],
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(kind: BookingKind, from: BookingStatus, to: BookingStatus) -> bool {
        valid_transitions(kind, from).contains(&to)
    }

    /// Whether a booking in `status` may be moved to another slot or date.
    pub fn can_reschedule(kind: BookingKind, status: BookingStatus) -> bool {
        match kind {
            BookingKind::Shopper => status == Approved,
            BookingKind::Volunteer => matches!(status, Pending | Approved),
        }
    }
}
