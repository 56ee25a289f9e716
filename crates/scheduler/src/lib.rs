//! Booking engine for the food bank scheduler.
//!
//! - [`BookingEngine`]: availability, booking, conflicts, reschedules,
//!   lifecycle transitions and recurring series.
//! - [`MemoryStore`]: in-process [`BookingStore`](pantry_core::store::BookingStore).
//! - [`SchedulerConfig`]: organization time zone and engine limits.

pub mod catalog_cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod memory;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SchedulerConfig;
pub use engine::{BookOutcome, BookingEngine, RecurringOutcome, SeriesCancellation};
pub use memory::MemoryStore;
