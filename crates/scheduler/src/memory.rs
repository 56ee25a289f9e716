//! In-process [`BookingStore`] used by tests, demos and single-node setups.
//!
//! Claims are serialized per `(subject, date)` and then per
//! `(target, date)` with async mutexes held across the overlap and capacity
//! reads and the insert, the same contract the Postgres store meets with
//! advisory locks.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use pantry_core::booking::{Booking, BookingKind, NewSeries, RecurringSeries, SlotRef, Subject};
use pantry_core::catalog::Catalog;
use pantry_core::conflict::first_on_targets;
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::status::{occupies_capacity, BookingStatus};
use pantry_core::store::{BookingStore, Claim, ClaimOutcome, Relocation, StatusChange};
use pantry_core::types::DbId;

type PairKey = (SlotRef, NaiveDate);
type SubjectKey = (Subject, NaiveDate);

fn poisoned<T>(_: T) -> BookingError {
    BookingError::Storage("memory store poisoned".into())
}

/// Async mutexes created on first use per key. An entry is dropped as soon
/// as nobody holds or waits on it, so the map only grows with the number of
/// keys in flight.
#[derive(Debug)]
struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    async fn acquire(&self, key: K) -> BookingResult<KeyedGuard<'_, K>> {
        let lock = {
            let mut locks = self.locks.lock().map_err(poisoned)?;
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        let guard = lock.lock_owned().await;
        Ok(KeyedGuard {
            locks: self,
            key,
            guard: Some(guard),
        })
    }

    fn release(&self, key: &K) {
        if let Ok(mut locks) = self.locks.lock() {
            // Clones are only made under this mutex, so a count of one means
            // no other task can be holding or waiting on the lock.
            if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
                locks.remove(key);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or_default()
    }
}

struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    locks: &'a KeyedLocks<K>,
    key: K,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release(&self.key);
    }
}

#[derive(Debug, Default)]
struct State {
    catalog: Catalog,
    bookings: BTreeMap<(BookingKind, DbId), Booking>,
    series: BTreeMap<DbId, RecurringSeries>,
    next_booking_id: HashMap<BookingKind, DbId>,
    next_series_id: DbId,
}

impl State {
    fn occupying(&self, target: SlotRef, date: NaiveDate, exclude: Option<DbId>) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.target == target && b.date == date)
            .filter(|b| Some(b.id) != exclude)
            .filter(|b| occupies_capacity(b.kind(), b.status))
            .count() as i64
    }

    fn active_for(&self, subject: Subject, date: NaiveDate) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| b.subject == subject && b.date == date && b.is_active())
            .cloned()
            .collect()
    }

    fn allocate_id(&mut self, kind: BookingKind) -> DbId {
        let next = self.next_booking_id.entry(kind).or_insert(0);
        *next += 1;
        *next
    }
}

/// Bookings, series and catalog held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    subject_locks: KeyedLocks<SubjectKey>,
    pair_locks: KeyedLocks<PairKey>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.catalog = catalog;
        }
        store
    }

    /// Apply an in-place catalog edit. Callers must invalidate any engine
    /// cache.
    pub fn edit_catalog(&self, edit: impl FnOnce(&mut Catalog)) -> BookingResult<()> {
        edit(&mut self.state()?.catalog);
        Ok(())
    }

    fn state(&self) -> BookingResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(poisoned)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn load_catalog(&self) -> BookingResult<Catalog> {
        Ok(self.state()?.catalog.clone())
    }

    async fn occupancy(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<HashMap<SlotRef, i64>> {
        let state = self.state()?;
        let mut counts = HashMap::new();
        for b in state.bookings.values() {
            if b.kind() == kind && b.date == date && occupies_capacity(kind, b.status) {
                *counts.entry(b.target).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn find(&self, kind: BookingKind, id: DbId) -> BookingResult<Option<Booking>> {
        Ok(self.state()?.bookings.get(&(kind, id)).cloned())
    }

    async fn find_by_token(&self, token: &str) -> BookingResult<Option<Booking>> {
        Ok(self
            .state()?
            .bookings
            .values()
            .find(|b| b.reschedule_token == token)
            .cloned())
    }

    async fn active_for_subject(
        &self,
        subject: Subject,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        Ok(self.state()?.active_for(subject, date))
    }

    async fn list_for_subject(
        &self,
        subject: Subject,
        from: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let mut rows: Vec<Booking> = self
            .state()?
            .bookings
            .values()
            .filter(|b| b.subject == subject && b.date >= from)
            .cloned()
            .collect();
        rows.sort_by_key(|b| (b.date, b.id));
        Ok(rows)
    }

    async fn list_for_date(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        Ok(self
            .state()?
            .bookings
            .values()
            .filter(|b| b.kind() == kind && b.date == date)
            .cloned()
            .collect())
    }

    async fn claim(&self, claim: Claim) -> BookingResult<ClaimOutcome> {
        let kind = claim.target.kind();
        let _subject = self.subject_locks.acquire((claim.subject, claim.date)).await?;
        let _pair = self.pair_locks.acquire((claim.target, claim.date)).await?;

        // Read phase.
        let (count, replaced) = {
            let state = self.state()?;
            let replaced = match claim.replaces {
                Some(id) => match state.bookings.get(&(kind, id)) {
                    Some(b) if b.is_active() => Some(b.clone()),
                    other => return Ok(ClaimOutcome::Stale(other.cloned())),
                },
                None => None,
            };
            let held = state.active_for(claim.subject, claim.date);
            if let Some(existing) = first_on_targets(held, &claim.overlapping, claim.replaces) {
                return Ok(ClaimOutcome::Overlap(existing));
            }
            // A replaced booking in the same pair frees its seat.
            let exclude = replaced
                .as_ref()
                .filter(|b| b.target == claim.target && b.date == claim.date)
                .map(|b| b.id);
            (state.occupying(claim.target, claim.date, exclude), replaced)
        };

        if count >= claim.capacity as i64 {
            return Ok(ClaimOutcome::Full);
        }

        // Let other tasks run between read and write, as a database round
        // trip would; the held locks keep this safe.
        tokio::task::yield_now().await;

        // Write phase.
        let mut state = self.state()?;
        let now = Utc::now();
        if let Some(old) = replaced {
            match state.bookings.get_mut(&(kind, old.id)) {
                Some(current) if current.status == old.status => {
                    current.status = BookingStatus::Cancelled;
                    current.reason = Some("replaced by new booking".into());
                    current.updated_at = now;
                }
                other => return Ok(ClaimOutcome::Stale(other.map(|b| b.clone()))),
            }
        }

        let id = state.allocate_id(kind);
        let booking = Booking {
            id,
            subject: claim.subject,
            target: claim.target,
            date: claim.date,
            status: claim.status,
            note: claim.note,
            staff_note: None,
            reason: None,
            recurring_id: claim.recurring_id,
            reschedule_token: claim.reschedule_token,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert((kind, id), booking.clone());
        Ok(ClaimOutcome::Claimed(booking))
    }

    async fn relocate(&self, relocation: Relocation) -> BookingResult<ClaimOutcome> {
        let key = (relocation.kind, relocation.id);
        let _subject = self
            .subject_locks
            .acquire((relocation.subject, relocation.date))
            .await?;
        let _pair = self
            .pair_locks
            .acquire((relocation.target, relocation.date))
            .await?;

        let count = {
            let state = self.state()?;
            match state.bookings.get(&key) {
                Some(b) if b.status == relocation.expected_status => {}
                other => return Ok(ClaimOutcome::Stale(other.cloned())),
            }
            let held = state.active_for(relocation.subject, relocation.date);
            if let Some(existing) =
                first_on_targets(held, &relocation.overlapping, Some(relocation.id))
            {
                return Ok(ClaimOutcome::Overlap(existing));
            }
            state.occupying(relocation.target, relocation.date, Some(relocation.id))
        };

        if count >= relocation.capacity as i64 {
            return Ok(ClaimOutcome::Full);
        }

        tokio::task::yield_now().await;

        let mut state = self.state()?;
        match state.bookings.get_mut(&key) {
            Some(b) if b.status == relocation.expected_status => {
                b.target = relocation.target;
                b.date = relocation.date;
                b.updated_at = Utc::now();
                Ok(ClaimOutcome::Claimed(b.clone()))
            }
            other => Ok(ClaimOutcome::Stale(other.map(|b| b.clone()))),
        }
    }

    async fn transition(&self, change: StatusChange) -> BookingResult<Option<Booking>> {
        let mut state = self.state()?;
        match state.bookings.get_mut(&(change.kind, change.id)) {
            Some(b) if b.status == change.from => {
                b.status = change.to;
                if change.reason.is_some() {
                    b.reason = change.reason;
                }
                b.updated_at = Utc::now();
                Ok(Some(b.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn create_series(&self, series: NewSeries) -> BookingResult<RecurringSeries> {
        let mut state = self.state()?;
        state.next_series_id += 1;
        let row = RecurringSeries {
            id: state.next_series_id,
            volunteer_id: series.volunteer_id,
            shift_id: series.shift_id,
            start_date: series.start_date,
            end_date: series.end_date,
            frequency: series.frequency,
            weekdays: series.weekdays,
            created_at: Utc::now(),
        };
        state.series.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_series(&self, id: DbId) -> BookingResult<Option<RecurringSeries>> {
        Ok(self.state()?.series.get(&id).cloned())
    }

    async fn series_members(&self, id: DbId) -> BookingResult<Vec<Booking>> {
        let mut rows: Vec<Booking> = self
            .state()?
            .bookings
            .values()
            .filter(|b| b.recurring_id == Some(id))
            .cloned()
            .collect();
        rows.sort_by_key(|b| (b.date, b.id));
        Ok(rows)
    }
}
