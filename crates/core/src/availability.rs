//! Availability calculation for shopper slots and volunteer shifts.
//!
//! Pure functions over a [`Catalog`], per-target occupancy counts and the
//! organization-local "now". The engine supplies the counts from a snapshot
//! read; the claim step re-checks capacity authoritatively.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::booking::SlotRef;
use crate::catalog::{weekday_number, AvailabilityOverride, Catalog, TimeRange};
use crate::error::BookingError;
use crate::types::DbId;

/// Reason reported for Saturday/Sunday closures.
pub const WEEKEND_REASON: &str = "Pantry closed on weekends";

/// Reason reported when the requested date or start time has passed.
pub const PAST_REASON: &str = "date has passed";

/// Display state of a slot on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Open,
    Blocked,
    Break,
}

/// One shopper slot as offered for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot_id: DbId,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub capacity: i32,
    pub available: i32,
    pub status: SlotStatus,
    /// Block or break reason when `status` is not `open`.
    pub reason: Option<String>,
}

impl SlotAvailability {
    pub fn is_bookable(&self) -> bool {
        self.status == SlotStatus::Open && self.available > 0
    }
}

/// One volunteer shift as offered for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftAvailability {
    pub shift_id: DbId,
    pub role_id: DbId,
    pub role_name: String,
    pub categories: Vec<String>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub max_volunteers: i32,
    pub booked: i64,
    pub available: i32,
}

/// Availability for one date after any past-date advancement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAvailability<T> {
    /// Date the caller asked for.
    pub requested_date: NaiveDate,
    /// Date the slots belong to (differs when a past date was advanced).
    pub date: NaiveDate,
    /// Whole-day closure reason (holiday name, weekend) when `slots` is empty
    /// because the pantry is closed.
    pub closed_reason: Option<String>,
    pub slots: Vec<T>,
}

// ---------------------------------------------------------------------------
// Calendar rules
// ---------------------------------------------------------------------------

/// 1-based ordinal of `date`'s weekday within its month.
///
/// Week `n` covers days `7(n-1)+1 ..= 7n`, so the first Monday of a month is
/// always week 1 regardless of which weekday the month starts on.
pub fn week_of_month(date: NaiveDate) -> u8 {
    ((date.day() - 1) / 7 + 1) as u8
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whole-day closure reason for the pantry, if any (weekend or holiday).
///
/// Holidays win over weekends so the lowest-level reason is reported.
pub fn day_closure(catalog: &Catalog, date: NaiveDate) -> Option<String> {
    if let Some(reason) = catalog.holiday_on(date) {
        return Some(reason.to_string());
    }
    if is_weekend(date) {
        return Some(WEEKEND_REASON.to_string());
    }
    None
}

/// Block/break state of a shopper slot on a date (ignoring whole-day closure).
pub fn slot_status(
    overrides: &[AvailabilityOverride],
    slot_id: DbId,
    date: NaiveDate,
) -> (SlotStatus, Option<String>) {
    let dow = weekday_number(date);
    let week = week_of_month(date);
    let mut on_break = None;

    for o in overrides {
        match o {
            AvailabilityOverride::BlockedSlot {
                date: d,
                slot_id: s,
                reason,
            } if *d == date && *s == slot_id => {
                return (SlotStatus::Blocked, Some(reason.clone()));
            }
            AvailabilityOverride::RecurringBlockedSlot {
                day_of_week,
                week_of_month: w,
                slot_id: s,
                reason,
            } if *day_of_week == dow && *w == week && *s == slot_id => {
                return (SlotStatus::Blocked, Some(reason.clone()));
            }
            AvailabilityOverride::Break {
                day_of_week,
                slot_id: s,
                reason,
            } if *day_of_week == dow && *s == slot_id => {
                on_break.get_or_insert_with(|| reason.clone());
            }
            _ => {}
        }
    }

    match on_break {
        Some(reason) => (SlotStatus::Break, Some(reason)),
        None => (SlotStatus::Open, None),
    }
}

/// First date on or after `from` that is not a weekend or holiday.
pub fn next_open_date(catalog: &Catalog, from: NaiveDate, max_days: u32) -> Option<NaiveDate> {
    (0..=max_days as i64)
        .map(|offset| from + Duration::days(offset))
        .find(|d| day_closure(catalog, *d).is_none())
}

fn elapsed(now: NaiveDateTime, date: NaiveDate, range: &TimeRange) -> bool {
    date < now.date() || (date == now.date() && range.start <= now.time())
}

fn remaining(capacity: i32, count: i64) -> i32 {
    (capacity as i64 - count).max(0) as i32
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Shopper slots for `date`, ordered by start time.
///
/// Returns an empty list when the pantry is closed that day. Unless
/// `include_past`, slots whose start time has already elapsed are dropped.
pub fn shopper_slots(
    catalog: &Catalog,
    date: NaiveDate,
    counts: &HashMap<SlotRef, i64>,
    now: NaiveDateTime,
    include_past: bool,
) -> Vec<SlotAvailability> {
    if day_closure(catalog, date).is_some() {
        return Vec::new();
    }

    let mut slots: Vec<SlotAvailability> = catalog
        .slots
        .iter()
        .filter(|s| include_past || !elapsed(now, date, &s.time_range()))
        .map(|s| {
            let count = counts.get(&SlotRef::Shopper(s.id)).copied().unwrap_or(0);
            let (status, reason) = slot_status(&catalog.overrides, s.id, date);
            SlotAvailability {
                slot_id: s.id,
                start_time: s.start_time,
                end_time: s.end_time,
                capacity: s.capacity,
                available: remaining(s.capacity, count),
                status,
                reason,
            }
        })
        .collect();
    slots.sort_by_key(|s| (s.start_time, s.slot_id));
    slots
}

/// Volunteer shifts for `date`, ordered by start time.
///
/// On weekends and holidays only shifts in an `always_open` category are
/// listed (gardening and special events run when the pantry is closed).
pub fn volunteer_shifts(
    catalog: &Catalog,
    date: NaiveDate,
    counts: &HashMap<SlotRef, i64>,
    now: NaiveDateTime,
    include_past: bool,
    always_open: &[String],
) -> Vec<ShiftAvailability> {
    let pantry_closed = day_closure(catalog, date).is_some();

    let mut shifts: Vec<ShiftAvailability> = catalog
        .shifts
        .iter()
        .filter(|s| !pantry_closed || s.in_any_category(always_open))
        .filter(|s| include_past || !elapsed(now, date, &s.time_range()))
        .map(|s| {
            let booked = counts.get(&SlotRef::Shift(s.shift_id)).copied().unwrap_or(0);
            ShiftAvailability {
                shift_id: s.shift_id,
                role_id: s.role_id,
                role_name: s.role_name.clone(),
                categories: s.categories.clone(),
                start_time: s.start_time,
                end_time: s.end_time,
                max_volunteers: s.max_volunteers,
                booked,
                available: remaining(s.max_volunteers, booked),
            }
        })
        .collect();
    shifts.sort_by_key(|s| (s.start_time, s.role_id, s.shift_id));
    shifts
}

// ---------------------------------------------------------------------------
// Booking precondition
// ---------------------------------------------------------------------------

/// A target confirmed open for booking on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookable {
    pub range: TimeRange,
    pub capacity: i32,
}

/// Check that `target` may be booked on `date`.
///
/// Capacity is not checked here; the ledger claim is authoritative.
pub fn check_bookable(
    catalog: &Catalog,
    target: SlotRef,
    date: NaiveDate,
    now: NaiveDateTime,
    always_open: &[String],
) -> Result<Bookable, BookingError> {
    let (range, capacity) = catalog.resolve(target).ok_or_else(|| {
        BookingError::not_found(
            match target {
                SlotRef::Shopper(_) => "Slot",
                SlotRef::Shift(_) => "VolunteerRoleShift",
            },
            target.id(),
        )
    })?;

    let closed = |reason: String| BookingError::SlotClosed {
        target,
        date,
        reason,
    };

    if elapsed(now, date, &range) {
        return Err(closed(PAST_REASON.to_string()));
    }

    match target {
        SlotRef::Shopper(slot_id) => {
            if let Some(reason) = day_closure(catalog, date) {
                return Err(closed(reason));
            }
            let (status, reason) = slot_status(&catalog.overrides, slot_id, date);
            if status != SlotStatus::Open {
                return Err(closed(reason.unwrap_or_else(|| "slot unavailable".into())));
            }
        }
        SlotRef::Shift(shift_id) => {
            if let Some(reason) = day_closure(catalog, date) {
                let stays_open = catalog
                    .shift(shift_id)
                    .is_some_and(|s| s.in_any_category(always_open));
                if !stays_open {
                    return Err(closed(reason));
                }
            }
        }
    }

    Ok(Bookable { range, capacity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Slot, VolunteerRoleShift};
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn early_morning(date: NaiveDate) -> NaiveDateTime {
        date.and_time(t(6, 0))
    }

    fn catalog() -> Catalog {
        Catalog {
            slots: vec![
                Slot { id: 2, start_time: t(10, 0), end_time: t(10, 30), capacity: 4 },
                Slot { id: 1, start_time: t(9, 0), end_time: t(9, 30), capacity: 4 },
            ],
            shifts: vec![
                VolunteerRoleShift {
                    shift_id: 10,
                    role_id: 1,
                    role_name: "Pantry".into(),
                    categories: vec!["Pantry".into()],
                    start_time: t(9, 0),
                    end_time: t(12, 0),
                    max_volunteers: 3,
                },
                VolunteerRoleShift {
                    shift_id: 20,
                    role_id: 2,
                    role_name: "Event Helper".into(),
                    categories: vec!["Special Events".into()],
                    start_time: t(13, 0),
                    end_time: t(16, 0),
                    max_volunteers: 10,
                },
            ],
            overrides: vec![],
        }
    }

    fn always_open() -> Vec<String> {
        vec!["Gardening".into(), "Special Events".into()]
    }

    // -----------------------------------------------------------------------
    // week_of_month
    // -----------------------------------------------------------------------

    #[test]
    fn first_seven_days_are_week_one() {
        // May 2024 starts on a Wednesday.
        assert_eq!(week_of_month(d(2024, 5, 1)), 1);
        assert_eq!(week_of_month(d(2024, 5, 6)), 1); // first Monday
        assert_eq!(week_of_month(d(2024, 5, 7)), 1);
        assert_eq!(week_of_month(d(2024, 5, 8)), 2);
        assert_eq!(week_of_month(d(2024, 5, 13)), 2); // second Monday
        assert_eq!(week_of_month(d(2024, 5, 29)), 5);
    }

    // -----------------------------------------------------------------------
    // Shopper slots
    // -----------------------------------------------------------------------

    #[test]
    fn slots_ordered_and_counted() {
        let date = d(2024, 1, 2);
        let counts = HashMap::from([(SlotRef::Shopper(1), 3)]);
        let slots = shopper_slots(&catalog(), date, &counts, early_morning(date), false);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].slot_id, 1);
        assert_eq!(slots[0].available, 1);
        assert_eq!(slots[1].available, 4);
    }

    #[test]
    fn available_never_negative() {
        let date = d(2024, 1, 2);
        let counts = HashMap::from([(SlotRef::Shopper(1), 9)]);
        let slots = shopper_slots(&catalog(), date, &counts, early_morning(date), false);
        assert_eq!(slots[0].available, 0);
        assert!(!slots[0].is_bookable());
    }

    #[test]
    fn saturday_has_no_shopper_slots() {
        let sat = d(2024, 5, 11);
        let slots = shopper_slots(&catalog(), sat, &HashMap::new(), early_morning(sat), false);
        assert!(slots.is_empty());
    }

    #[test]
    fn holiday_has_no_shopper_slots() {
        let mut cat = catalog();
        let date = d(2024, 12, 25);
        cat.overrides.push(AvailabilityOverride::Holiday {
            date,
            reason: "Christmas".into(),
        });
        assert!(shopper_slots(&cat, date, &HashMap::new(), early_morning(date), false).is_empty());
        assert_eq!(day_closure(&cat, date).as_deref(), Some("Christmas"));
    }

    #[test]
    fn blocked_and_break_slots_shown_but_not_bookable() {
        let mut cat = catalog();
        let date = d(2024, 1, 2); // Tuesday
        cat.overrides.push(AvailabilityOverride::BlockedSlot {
            date,
            slot_id: 1,
            reason: "Inventory count".into(),
        });
        cat.overrides.push(AvailabilityOverride::Break {
            day_of_week: 2,
            slot_id: 2,
            reason: "Staff lunch".into(),
        });
        let slots = shopper_slots(&cat, date, &HashMap::new(), early_morning(date), false);
        assert_eq!(slots[0].status, SlotStatus::Blocked);
        assert_eq!(slots[0].reason.as_deref(), Some("Inventory count"));
        assert_eq!(slots[1].status, SlotStatus::Break);
        assert!(slots.iter().all(|s| !s.is_bookable()));
    }

    #[test]
    fn recurring_block_matches_ordinal_weekday() {
        let mut cat = catalog();
        cat.overrides.push(AvailabilityOverride::RecurringBlockedSlot {
            day_of_week: 1,
            week_of_month: 2,
            slot_id: 1,
            reason: "Monthly delivery".into(),
        });
        let second_monday = d(2024, 5, 13);
        let first_monday = d(2024, 5, 6);
        assert_eq!(
            slot_status(&cat.overrides, 1, second_monday).0,
            SlotStatus::Blocked
        );
        assert_eq!(slot_status(&cat.overrides, 1, first_monday).0, SlotStatus::Open);
        assert_eq!(slot_status(&cat.overrides, 2, second_monday).0, SlotStatus::Open);
    }

    #[test]
    fn elapsed_slots_dropped_unless_include_past() {
        let date = d(2024, 1, 2);
        let now = date.and_time(t(9, 15));
        let slots = shopper_slots(&catalog(), date, &HashMap::new(), now, false);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].slot_id, 2);
        let all = shopper_slots(&catalog(), date, &HashMap::new(), now, true);
        assert_eq!(all.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Volunteer shifts
    // -----------------------------------------------------------------------

    #[test]
    fn saturday_keeps_special_event_shifts() {
        let sat = d(2024, 5, 11);
        let shifts = volunteer_shifts(
            &catalog(),
            sat,
            &HashMap::new(),
            early_morning(sat),
            false,
            &always_open(),
        );
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].shift_id, 20);
    }

    #[test]
    fn weekday_lists_all_shifts() {
        let date = d(2024, 5, 7);
        let counts = HashMap::from([(SlotRef::Shift(10), 2)]);
        let shifts = volunteer_shifts(
            &catalog(),
            date,
            &counts,
            early_morning(date),
            false,
            &always_open(),
        );
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].booked, 2);
        assert_eq!(shifts[0].available, 1);
    }

    // -----------------------------------------------------------------------
    // next_open_date / check_bookable
    // -----------------------------------------------------------------------

    #[test]
    fn next_open_skips_weekend_and_holiday() {
        let mut cat = catalog();
        cat.overrides.push(AvailabilityOverride::Holiday {
            date: d(2024, 5, 13),
            reason: "Closed".into(),
        });
        // Saturday 11th -> Sunday -> Monday holiday -> Tuesday 14th.
        assert_eq!(next_open_date(&cat, d(2024, 5, 11), 30), Some(d(2024, 5, 14)));
        assert_eq!(next_open_date(&cat, d(2024, 5, 11), 1), None);
    }

    #[test]
    fn check_bookable_rejects_holiday_with_reason() {
        let mut cat = catalog();
        let date = d(2024, 7, 1);
        cat.overrides.push(AvailabilityOverride::Holiday {
            date,
            reason: "Canada Day".into(),
        });
        let err = check_bookable(
            &cat,
            SlotRef::Shopper(1),
            date,
            early_morning(date),
            &always_open(),
        )
        .unwrap_err();
        match err {
            BookingError::SlotClosed { reason, .. } => assert_eq!(reason, "Canada Day"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn check_bookable_rejects_past_and_unknown() {
        let cat = catalog();
        let today = d(2024, 1, 3);
        let now = early_morning(today);
        assert!(matches!(
            check_bookable(&cat, SlotRef::Shopper(1), d(2024, 1, 2), now, &[]),
            Err(BookingError::SlotClosed { .. })
        ));
        assert!(matches!(
            check_bookable(&cat, SlotRef::Shopper(99), today, now, &[]),
            Err(BookingError::NotFound { .. })
        ));
    }

    #[test]
    fn check_bookable_allows_weekend_event_shift() {
        let cat = catalog();
        let sat = d(2024, 5, 11);
        let ok = check_bookable(&cat, SlotRef::Shift(20), sat, early_morning(sat), &always_open())
            .unwrap();
        assert_eq!(ok.capacity, 10);
        assert!(check_bookable(&cat, SlotRef::Shift(10), sat, early_morning(sat), &always_open())
            .is_err());
    }
}
