//! Booking event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`BookingEvent`] — the event envelope handed to the notification and
//!   visit-record collaborators.
//! - [`EventJournal`] — background subscriber writing every event to the
//!   structured log.

pub mod bus;
pub mod journal;

pub use bus::{BookingEvent, EventBus};
pub use journal::EventJournal;
