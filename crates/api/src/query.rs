//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use pantry_core::booking::BookingKind;
use pantry_core::types::DbId;
use serde::Deserialize;

/// `?date=&include_past=` for availability lookups.
#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    pub date: NaiveDate,
    #[serde(default)]
    pub include_past: bool,
    /// Volunteer shifts only: restrict to one role.
    pub role_id: Option<DbId>,
}

/// `?from=` for a person's upcoming bookings. Defaults to today.
#[derive(Debug, Deserialize)]
pub struct FromDateParams {
    pub from: Option<NaiveDate>,
}

/// `?kind=&date=` for the staff day sheet.
#[derive(Debug, Deserialize)]
pub struct DaySheetParams {
    pub kind: BookingKind,
    pub date: NaiveDate,
}

/// Query parameters for list endpoints that support an `include_inactive` flag.
#[derive(Debug, Deserialize)]
pub struct IncludeInactiveParams {
    #[serde(default)]
    pub include_inactive: bool,
}
