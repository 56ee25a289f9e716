//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods taking `&PgPool` run standalone; methods taking
//! `&mut PgConnection` are meant to run inside a caller's transaction.

pub mod availability_override_repo;
pub mod recurring_series_repo;
pub mod reservation_repo;
pub mod slot_repo;
pub mod volunteer_booking_repo;
pub mod volunteer_role_repo;

pub use availability_override_repo::AvailabilityOverrideRepo;
pub use recurring_series_repo::RecurringSeriesRepo;
pub use reservation_repo::{NewReservation, ReservationRepo};
pub use slot_repo::SlotRepo;
pub use volunteer_booking_repo::{NewVolunteerBooking, VolunteerBookingRepo};
pub use volunteer_role_repo::VolunteerRoleRepo;
