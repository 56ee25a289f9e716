//! The booking engine: availability, claims, conflicts, reschedules,
//! lifecycle transitions and recurring series.
//!
//! Every mutation goes through the [`BookingStore`] claim/transition
//! primitives, so the engine itself holds no per-booking state beyond the
//! catalog cache.

mod availability;
mod booking;
mod lifecycle;
mod recurring;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use pantry_core::booking::{Booking, BookingHandle};
use pantry_core::catalog::Catalog;
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::store::BookingStore;
use pantry_core::token;
use pantry_events::{BookingEvent, EventBus};

use crate::catalog_cache::CatalogCache;
use crate::clock::Clock;
use crate::config::SchedulerConfig;

pub use booking::BookOutcome;
pub use recurring::{RecurringOutcome, SeriesCancellation};

pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    catalog: CatalogCache,
    events: Arc<EventBus>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl BookingEngine {
    pub fn new(
        store: Arc<dyn BookingStore>,
        events: Arc<EventBus>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            catalog: CatalogCache::new(),
            events,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Drop the cached catalog after staff edit slots, shifts or overrides.
    pub fn invalidate_catalog(&self) {
        self.catalog.invalidate();
    }

    /// How many times the catalog cache has been invalidated.
    pub fn catalog_generation(&self) -> u64 {
        self.catalog.generation()
    }

    pub async fn catalog(&self) -> BookingResult<Arc<Catalog>> {
        self.catalog.get(self.store.as_ref()).await
    }

    /// Organization-local wall-clock time.
    pub fn local_now(&self) -> NaiveDateTime {
        self.clock
            .now()
            .with_timezone(&self.config.timezone)
            .naive_local()
    }

    /// Organization-local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }

    /// Look up a booking by id or reschedule token.
    pub async fn find(&self, handle: &BookingHandle) -> BookingResult<Booking> {
        let found = match handle {
            BookingHandle::Id(kind, id) => self.store.find(*kind, *id).await?,
            BookingHandle::Token(t) if token::is_well_formed(t) => {
                self.store.find_by_token(t).await?
            }
            BookingHandle::Token(_) => None,
        };
        found.ok_or_else(|| BookingError::not_found("Booking", handle))
    }

    fn publish(&self, event: BookingEvent) {
        self.events.publish(event);
    }
}
