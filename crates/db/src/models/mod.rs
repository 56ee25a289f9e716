//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create DTOs for the staff catalog endpoints
//! - Conversions into the `pantry_core` domain types

pub mod availability_override;
pub mod recurring_series;
pub mod reservation;
pub mod slot;
pub mod status;
pub mod volunteer_booking;
pub mod volunteer_role;
