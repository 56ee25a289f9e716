//! [`BookingStore`] over Postgres.
//!
//! Claims and relocations take two transaction-scoped advisory locks: first
//! one keyed by `(subject, date)`, then one keyed by `(target, date)`. Two
//! requests by the same person on the same date serialize their overlap
//! check, and two claims on the same pair serialize their capacity count.
//! The order is always subject then pair and a transaction never takes more
//! than one of each, so lock waits cannot form a cycle.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use pantry_core::booking::{Booking, BookingKind, NewSeries, RecurringSeries, SlotRef, Subject};
use pantry_core::catalog::Catalog;
use pantry_core::conflict::first_on_targets;
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::status::BookingStatus;
use pantry_core::store::{BookingStore, Claim, ClaimOutcome, Relocation, StatusChange};
use pantry_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::status::{occupying_ids, status_id_for, StatusId};
use crate::repositories::{
    AvailabilityOverrideRepo, NewReservation, NewVolunteerBooking, RecurringSeriesRepo,
    ReservationRepo, SlotRepo, VolunteerBookingRepo, VolunteerRoleRepo,
};

/// Reason recorded on a booking cancelled by a replace-with-new choice.
const REPLACED_REASON: &str = "replaced by new booking";

fn storage(err: sqlx::Error) -> BookingError {
    tracing::error!(error = %err, "Database error");
    BookingError::Storage(err.to_string())
}

fn column_status(kind: BookingKind, status: BookingStatus) -> BookingResult<StatusId> {
    status_id_for(kind, status).ok_or_else(|| {
        BookingError::Invalid(format!("{kind} bookings cannot be {status}"))
    })
}

/// Advisory lock key for one capacity bucket on one date.
fn pair_key(target: SlotRef, date: NaiveDate) -> String {
    format!("{target}:{date}")
}

/// Advisory lock key for one person's bookings on one date.
fn subject_key(subject: Subject, date: NaiveDate) -> String {
    format!("subject:{subject}:{date}")
}

/// Block until this transaction holds the advisory lock for `key`.
async fn advisory_lock(conn: &mut PgConnection, key: String) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(key)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Take the subject lock, then the pair lock.
async fn lock_subject_and_pair(
    conn: &mut PgConnection,
    subject: Subject,
    target: SlotRef,
    date: NaiveDate,
) -> BookingResult<()> {
    advisory_lock(conn, subject_key(subject, date))
        .await
        .map_err(storage)?;
    advisory_lock(conn, pair_key(target, date))
        .await
        .map_err(storage)
}

fn active_ids(kind: BookingKind) -> Vec<StatusId> {
    [BookingStatus::Pending, BookingStatus::Approved]
        .into_iter()
        .filter_map(|s| status_id_for(kind, s))
        .collect()
}

/// Postgres-backed booking ledger.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock_booking(
        conn: &mut PgConnection,
        kind: BookingKind,
        id: DbId,
    ) -> BookingResult<Option<Booking>> {
        match kind {
            BookingKind::Shopper => ReservationRepo::lock(conn, id)
                .await
                .map_err(storage)?
                .map(Booking::try_from)
                .transpose(),
            BookingKind::Volunteer => VolunteerBookingRepo::lock(conn, id)
                .await
                .map_err(storage)?
                .map(Booking::try_from)
                .transpose(),
        }
    }

    async fn active_for(
        conn: &mut PgConnection,
        subject: Subject,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let ids = active_ids(subject.kind());
        match subject {
            Subject::Volunteer(id) => VolunteerBookingRepo::for_volunteer_on(conn, id, date, &ids)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
            _ => ReservationRepo::for_subject_on(conn, subject, date, &ids)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
        }
    }

    async fn count(
        conn: &mut PgConnection,
        target: SlotRef,
        date: NaiveDate,
        exclude: Option<DbId>,
    ) -> BookingResult<i64> {
        let kind = target.kind();
        let ids = occupying_ids(kind);
        match target {
            SlotRef::Shopper(slot_id) => {
                ReservationRepo::count_for_slot(conn, slot_id, date, &ids, exclude).await
            }
            SlotRef::Shift(shift_id) => {
                VolunteerBookingRepo::count_for_shift(conn, shift_id, date, &ids, exclude).await
            }
        }
        .map_err(storage)
    }

    async fn set_status(
        conn: &mut PgConnection,
        change: &StatusChange,
    ) -> BookingResult<Option<Booking>> {
        let from = column_status(change.kind, change.from)?;
        let to = column_status(change.kind, change.to)?;
        let reason = change.reason.as_deref();
        match change.kind {
            BookingKind::Shopper => ReservationRepo::set_status(conn, change.id, from, to, reason)
                .await
                .map_err(storage)?
                .map(Booking::try_from)
                .transpose(),
            BookingKind::Volunteer => {
                VolunteerBookingRepo::set_status(conn, change.id, from, to, reason)
                    .await
                    .map_err(storage)?
                    .map(Booking::try_from)
                    .transpose()
            }
        }
    }

    async fn insert(conn: &mut PgConnection, claim: &Claim) -> BookingResult<Booking> {
        let status_id = column_status(claim.target.kind(), claim.status)?;
        match (claim.subject, claim.target) {
            (Subject::Volunteer(volunteer_id), SlotRef::Shift(shift_id)) => {
                let input = NewVolunteerBooking {
                    volunteer_id,
                    slot_id: shift_id,
                    date: claim.date,
                    status_id,
                    note: claim.note.clone(),
                    recurring_id: claim.recurring_id,
                    reschedule_token: claim.reschedule_token.clone(),
                };
                VolunteerBookingRepo::insert(conn, &input)
                    .await
                    .map_err(storage)?
                    .try_into()
            }
            (subject @ (Subject::Client(_) | Subject::NewClient(_)), SlotRef::Shopper(slot_id)) => {
                let (client_id, new_client_id) = match subject {
                    Subject::NewClient(id) => (None, Some(id)),
                    other => (Some(other.id()), None),
                };
                let input = NewReservation {
                    client_id,
                    new_client_id,
                    slot_id,
                    date: claim.date,
                    status_id,
                    note: claim.note.clone(),
                    reschedule_token: claim.reschedule_token.clone(),
                };
                ReservationRepo::insert(conn, &input)
                    .await
                    .map_err(storage)?
                    .try_into()
            }
            (subject, target) => Err(BookingError::Invalid(format!(
                "{subject} cannot book {target}"
            ))),
        }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn load_catalog(&self) -> BookingResult<Catalog> {
        let slots = SlotRepo::list(&self.pool).await.map_err(storage)?;
        let shifts = VolunteerRoleRepo::list_shifts(&self.pool, true)
            .await
            .map_err(storage)?;
        let overrides = AvailabilityOverrideRepo::load_all(&self.pool)
            .await
            .map_err(storage)?;
        Ok(Catalog {
            slots: slots.into_iter().map(Into::into).collect(),
            shifts: shifts.into_iter().map(Into::into).collect(),
            overrides,
        })
    }

    async fn occupancy(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<HashMap<SlotRef, i64>> {
        let ids = occupying_ids(kind);
        let rows = match kind {
            BookingKind::Shopper => ReservationRepo::occupancy(&self.pool, date, &ids).await,
            BookingKind::Volunteer => VolunteerBookingRepo::occupancy(&self.pool, date, &ids).await,
        }
        .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| {
                let target = match kind {
                    BookingKind::Shopper => SlotRef::Shopper(id),
                    BookingKind::Volunteer => SlotRef::Shift(id),
                };
                (target, count)
            })
            .collect())
    }

    async fn find(&self, kind: BookingKind, id: DbId) -> BookingResult<Option<Booking>> {
        match kind {
            BookingKind::Shopper => ReservationRepo::find_by_id(&self.pool, id)
                .await
                .map_err(storage)?
                .map(Booking::try_from)
                .transpose(),
            BookingKind::Volunteer => VolunteerBookingRepo::find_by_id(&self.pool, id)
                .await
                .map_err(storage)?
                .map(Booking::try_from)
                .transpose(),
        }
    }

    async fn find_by_token(&self, token: &str) -> BookingResult<Option<Booking>> {
        if let Some(row) = ReservationRepo::find_by_token(&self.pool, token)
            .await
            .map_err(storage)?
        {
            return Booking::try_from(row).map(Some);
        }
        VolunteerBookingRepo::find_by_token(&self.pool, token)
            .await
            .map_err(storage)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn active_for_subject(
        &self,
        subject: Subject,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        Self::active_for(&mut conn, subject, date).await
    }

    async fn list_for_subject(
        &self,
        subject: Subject,
        from: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        match subject {
            Subject::Volunteer(id) => VolunteerBookingRepo::list_for_volunteer(&self.pool, id, from)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
            _ => ReservationRepo::list_for_subject(&self.pool, subject, from)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
        }
    }

    async fn list_for_date(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        match kind {
            BookingKind::Shopper => ReservationRepo::list_for_date(&self.pool, date)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
            BookingKind::Volunteer => VolunteerBookingRepo::list_for_date(&self.pool, date)
                .await
                .map_err(storage)?
                .into_iter()
                .map(Booking::try_from)
                .collect(),
        }
    }

    async fn claim(&self, claim: Claim) -> BookingResult<ClaimOutcome> {
        let kind = claim.target.kind();
        let mut tx = self.pool.begin().await.map_err(storage)?;
        lock_subject_and_pair(&mut tx, claim.subject, claim.target, claim.date).await?;

        let replaced = match claim.replaces {
            Some(id) => match Self::lock_booking(&mut tx, kind, id).await? {
                Some(b) if b.is_active() => Some(b),
                other => return Ok(ClaimOutcome::Stale(other)),
            },
            None => None,
        };

        let held = Self::active_for(&mut tx, claim.subject, claim.date).await?;
        if let Some(existing) = first_on_targets(held, &claim.overlapping, claim.replaces) {
            return Ok(ClaimOutcome::Overlap(existing));
        }

        // A replaced booking in the same pair frees its seat.
        let exclude = replaced
            .as_ref()
            .filter(|b| b.target == claim.target && b.date == claim.date)
            .map(|b| b.id);
        let count = Self::count(&mut tx, claim.target, claim.date, exclude).await?;
        if count >= claim.capacity as i64 {
            return Ok(ClaimOutcome::Full);
        }

        if let Some(old) = &replaced {
            let change = StatusChange {
                kind,
                id: old.id,
                from: old.status,
                to: BookingStatus::Cancelled,
                reason: Some(REPLACED_REASON.into()),
            };
            if Self::set_status(&mut tx, &change).await?.is_none() {
                return Ok(ClaimOutcome::Stale(Some(old.clone())));
            }
        }

        let booking = Self::insert(&mut tx, &claim).await?;
        tx.commit().await.map_err(storage)?;
        Ok(ClaimOutcome::Claimed(booking))
    }

    async fn relocate(&self, relocation: Relocation) -> BookingResult<ClaimOutcome> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        lock_subject_and_pair(&mut tx, relocation.subject, relocation.target, relocation.date)
            .await?;

        match Self::lock_booking(&mut tx, relocation.kind, relocation.id).await? {
            Some(b) if b.status == relocation.expected_status => {}
            other => return Ok(ClaimOutcome::Stale(other)),
        }

        let held = Self::active_for(&mut tx, relocation.subject, relocation.date).await?;
        if let Some(existing) =
            first_on_targets(held, &relocation.overlapping, Some(relocation.id))
        {
            return Ok(ClaimOutcome::Overlap(existing));
        }

        let count = Self::count(
            &mut tx,
            relocation.target,
            relocation.date,
            Some(relocation.id),
        )
        .await?;
        if count >= relocation.capacity as i64 {
            return Ok(ClaimOutcome::Full);
        }

        let moved: Booking = match relocation.target {
            SlotRef::Shopper(slot_id) => {
                ReservationRepo::move_to(&mut tx, relocation.id, slot_id, relocation.date)
                    .await
                    .map_err(storage)?
                    .try_into()?
            }
            SlotRef::Shift(shift_id) => {
                VolunteerBookingRepo::move_to(&mut tx, relocation.id, shift_id, relocation.date)
                    .await
                    .map_err(storage)?
                    .try_into()?
            }
        };
        tx.commit().await.map_err(storage)?;
        Ok(ClaimOutcome::Claimed(moved))
    }

    async fn transition(&self, change: StatusChange) -> BookingResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(storage)?;
        Self::set_status(&mut conn, &change).await
    }

    async fn create_series(&self, series: NewSeries) -> BookingResult<RecurringSeries> {
        RecurringSeriesRepo::create(&self.pool, &series)
            .await
            .map_err(storage)?
            .try_into()
    }

    async fn find_series(&self, id: DbId) -> BookingResult<Option<RecurringSeries>> {
        RecurringSeriesRepo::find_by_id(&self.pool, id)
            .await
            .map_err(storage)?
            .map(RecurringSeries::try_from)
            .transpose()
    }

    async fn series_members(&self, id: DbId) -> BookingResult<Vec<Booking>> {
        VolunteerBookingRepo::list_for_series(&self.pool, id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_keys_separate_ledgers_and_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(pair_key(SlotRef::Shopper(2), date), "slot:2:2024-05-07");
        assert_ne!(
            pair_key(SlotRef::Shopper(2), date),
            pair_key(SlotRef::Shift(2), date)
        );
    }

    #[test]
    fn subject_and_pair_keys_never_collide() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(
            subject_key(Subject::Volunteer(2), date),
            "subject:volunteer:2:2024-05-07"
        );
        assert_ne!(
            subject_key(Subject::Client(2), date),
            subject_key(Subject::NewClient(2), date)
        );
        assert!(!pair_key(SlotRef::Shift(2), date).starts_with("subject:"));
    }

    #[test]
    fn active_ids_per_ledger() {
        assert_eq!(active_ids(BookingKind::Shopper), vec![1]);
        assert_eq!(active_ids(BookingKind::Volunteer), vec![1, 2]);
    }

    #[test]
    fn shopper_pending_has_no_column_value() {
        assert!(matches!(
            column_status(BookingKind::Shopper, BookingStatus::Pending),
            Err(BookingError::Invalid(_))
        ));
    }
}
