use chrono::NaiveDate;
use pantry_core::availability::{
    self, day_closure, next_open_date, DayAvailability, ShiftAvailability, SlotAvailability,
};
use pantry_core::booking::BookingKind;
use pantry_core::error::BookingResult;
use pantry_core::types::DbId;

use super::BookingEngine;

impl BookingEngine {
    /// Shopper slots for `date`.
    ///
    /// A past date (without `include_past`) is advanced to the next date the
    /// pantry is open, counted from today.
    pub async fn shopper_availability(
        &self,
        date: NaiveDate,
        include_past: bool,
    ) -> BookingResult<DayAvailability<SlotAvailability>> {
        let catalog = self.catalog().await?;
        let today = self.today();

        let effective = if date < today && !include_past {
            next_open_date(&catalog, today, self.config.next_open_search_days).unwrap_or(today)
        } else {
            date
        };

        let counts = self.store.occupancy(BookingKind::Shopper, effective).await?;
        let slots = availability::shopper_slots(
            &catalog,
            effective,
            &counts,
            self.local_now(),
            include_past,
        );

        Ok(DayAvailability {
            requested_date: date,
            date: effective,
            closed_reason: day_closure(&catalog, effective),
            slots,
        })
    }

    /// Volunteer shifts for `date`, optionally for one role only.
    ///
    /// A past date (without `include_past`) is advanced to today: shifts in
    /// always-open categories may run even when the pantry is closed.
    pub async fn volunteer_availability(
        &self,
        date: NaiveDate,
        include_past: bool,
        role_id: Option<DbId>,
    ) -> BookingResult<DayAvailability<ShiftAvailability>> {
        let catalog = self.catalog().await?;
        let today = self.today();
        let effective = if date < today && !include_past { today } else { date };

        let counts = self.store.occupancy(BookingKind::Volunteer, effective).await?;
        let mut slots = availability::volunteer_shifts(
            &catalog,
            effective,
            &counts,
            self.local_now(),
            include_past,
            &self.config.always_open_categories,
        );
        if let Some(role_id) = role_id {
            slots.retain(|s| s.role_id == role_id);
        }

        Ok(DayAvailability {
            requested_date: date,
            date: effective,
            closed_reason: day_closure(&catalog, effective),
            slots,
        })
    }
}
