//! Food bank scheduling domain.
//!
//! Zero internal dependencies: catalog and booking types, the status
//! transition table, availability calculation, overlap detection,
//! recurrence expansion and the [`store::BookingStore`] persistence port.

pub mod availability;
pub mod booking;
pub mod catalog;
pub mod conflict;
pub mod error;
pub mod recurrence;
pub mod roles;
pub mod status;
pub mod store;
pub mod token;
pub mod types;
