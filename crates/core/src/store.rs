//! Persistence port for the booking engine.
//!
//! The engine only ever talks to storage through [`BookingStore`]. The claim
//! and relocate operations are the atomic check-then-write primitive. An
//! implementation must serialize them per `(subject, date)` and per
//! `(target, date)`, taking the subject lock first and then exactly one pair
//! lock. No lock is ever held across two different pairs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::booking::{Booking, BookingKind, NewSeries, RecurringSeries, SlotRef, Subject};
use crate::catalog::Catalog;
use crate::error::BookingResult;
use crate::status::BookingStatus;
use crate::types::DbId;

/// A seat claim to be checked against capacity and inserted atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub subject: Subject,
    pub target: SlotRef,
    pub date: NaiveDate,
    /// Seat limit at claim time.
    pub capacity: i32,
    pub status: BookingStatus,
    pub note: Option<String>,
    pub recurring_id: Option<DbId>,
    pub reschedule_token: String,
    /// Live booking of the same ledger to cancel in the same unit of work.
    pub replaces: Option<DbId>,
    /// Targets whose time range overlaps `target`. A live booking of the
    /// subject on any of them on `date` (other than `replaces`) blocks the
    /// claim.
    pub overlapping: Vec<SlotRef>,
}

/// Move an existing booking to a new target/date, re-checking capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relocation {
    pub kind: BookingKind,
    pub id: DbId,
    pub subject: Subject,
    /// The move only applies while the booking is still in this status.
    pub expected_status: BookingStatus,
    pub target: SlotRef,
    pub date: NaiveDate,
    pub capacity: i32,
    /// Targets overlapping the destination; see [`Claim::overlapping`].
    pub overlapping: Vec<SlotRef>,
}

/// Compare-and-set status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub kind: BookingKind,
    pub id: DbId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub reason: Option<String>,
}

/// Result of an atomic claim or relocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Booking),
    /// Capacity was exhausted when the lock was taken.
    Full,
    /// The subject already holds this live booking on an overlapping target.
    Overlap(Booking),
    /// The booking being replaced or moved changed status concurrently.
    /// Carries its current state when it still exists.
    Stale(Option<Booking>),
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Slots, shifts and suppression rules in one read.
    async fn load_catalog(&self) -> BookingResult<Catalog>;

    /// Occupying-booking counts per target for one ledger on one date.
    async fn occupancy(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<HashMap<SlotRef, i64>>;

    async fn find(&self, kind: BookingKind, id: DbId) -> BookingResult<Option<Booking>>;

    async fn find_by_token(&self, token: &str) -> BookingResult<Option<Booking>>;

    /// The subject's pending/approved bookings on `date`.
    async fn active_for_subject(
        &self,
        subject: Subject,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>>;

    /// All of a subject's bookings dated `from` or later, ordered by date.
    async fn list_for_subject(
        &self,
        subject: Subject,
        from: NaiveDate,
    ) -> BookingResult<Vec<Booking>>;

    /// Every booking of one ledger on `date` (staff day sheet).
    async fn list_for_date(&self, kind: BookingKind, date: NaiveDate)
        -> BookingResult<Vec<Booking>>;

    /// Atomically re-check the subject's overlaps and capacity, then insert
    /// (optionally cancelling `claim.replaces` in the same unit).
    async fn claim(&self, claim: Claim) -> BookingResult<ClaimOutcome>;

    /// Atomically re-check overlaps and destination capacity, then move the
    /// booking.
    async fn relocate(&self, relocation: Relocation) -> BookingResult<ClaimOutcome>;

    /// Apply `change` only if the booking is still in `change.from`.
    /// Returns `None` when the booking is missing or its status moved on.
    async fn transition(&self, change: StatusChange) -> BookingResult<Option<Booking>>;

    async fn create_series(&self, series: NewSeries) -> BookingResult<RecurringSeries>;

    async fn find_series(&self, id: DbId) -> BookingResult<Option<RecurringSeries>>;

    /// Every booking linked to the series, ordered by date.
    async fn series_members(&self, id: DbId) -> BookingResult<Vec<Booking>>;
}
