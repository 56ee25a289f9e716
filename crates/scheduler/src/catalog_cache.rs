//! Read-through cache of the slot catalog.
//!
//! Owned by the engine and invalidated explicitly whenever staff edit
//! slots, shifts or overrides.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use pantry_core::catalog::Catalog;
use pantry_core::error::BookingResult;
use pantry_core::store::BookingStore;

#[derive(Debug, Default)]
pub struct CatalogCache {
    cached: RwLock<Option<Arc<Catalog>>>,
    /// Bumped on every invalidation so a load that raced an edit is not
    /// cached.
    generation: AtomicU64,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached catalog, loading it from `store` on a miss.
    pub async fn get(&self, store: &dyn BookingStore) -> BookingResult<Arc<Catalog>> {
        if let Some(catalog) = self.cached.read().ok().and_then(|g| g.clone()) {
            return Ok(catalog);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let fresh = Arc::new(store.load_catalog().await?);
        tracing::debug!(
            slots = fresh.slots.len(),
            shifts = fresh.shifts.len(),
            overrides = fresh.overrides.len(),
            "Catalog loaded"
        );

        if let Ok(mut guard) = self.cached.write() {
            if self.generation.load(Ordering::Acquire) == generation {
                *guard = Some(Arc::clone(&fresh));
            }
        }
        Ok(fresh)
    }

    /// Number of invalidations since startup.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut guard) = self.cached.write() {
            *guard = None;
        }
        tracing::debug!("Catalog cache invalidated");
    }
}
