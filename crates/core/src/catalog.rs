//! Slot catalog: shopper slots, volunteer role shifts and the suppression
//! rules (holidays, blocks, breaks) consulted by the availability calculator.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::booking::SlotRef;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Time ranges
// ---------------------------------------------------------------------------

/// Half-open time-of-day interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Two ranges on the same date overlap iff `s1 < e2 && s2 < e1`.
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// A shopper appointment slot (time of day + seat count).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: DbId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

impl Slot {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }
}

/// One shift of a volunteer role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerRoleShift {
    pub shift_id: DbId,
    pub role_id: DbId,
    pub role_name: String,
    /// Display/grouping categories; a shift may belong to several.
    pub categories: Vec<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_volunteers: i32,
}

impl VolunteerRoleShift {
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// Whether any of this shift's categories stays open on closed days.
    pub fn in_any_category(&self, allow_list: &[String]) -> bool {
        self.categories
            .iter()
            .any(|c| allow_list.iter().any(|a| a.eq_ignore_ascii_case(c)))
    }
}

/// Suppression rule hiding future availability. Never mutates reservations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvailabilityOverride {
    /// Whole pantry closed for the day.
    Holiday { date: NaiveDate, reason: String },
    /// One slot closed on one date.
    BlockedSlot {
        date: NaiveDate,
        slot_id: DbId,
        reason: String,
    },
    /// One slot closed on the n-th occurrence of a weekday in every month.
    RecurringBlockedSlot {
        /// `0 = Sunday .. 6 = Saturday`.
        day_of_week: u8,
        /// 1-based ordinal, see [`crate::availability::week_of_month`].
        week_of_month: u8,
        slot_id: DbId,
        reason: String,
    },
    /// Staff break; the slot is shown but never offered.
    Break {
        day_of_week: u8,
        slot_id: DbId,
        reason: String,
    },
}

/// Weekday number with `0 = Sunday .. 6 = Saturday`.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Everything the availability calculator needs, loaded in one read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub slots: Vec<Slot>,
    pub shifts: Vec<VolunteerRoleShift>,
    pub overrides: Vec<AvailabilityOverride>,
}

impl Catalog {
    pub fn slot(&self, id: DbId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn shift(&self, id: DbId) -> Option<&VolunteerRoleShift> {
        self.shifts.iter().find(|s| s.shift_id == id)
    }

    /// Time range and seat limit for a target, if it exists.
    pub fn resolve(&self, target: SlotRef) -> Option<(TimeRange, i32)> {
        match target {
            SlotRef::Shopper(id) => self.slot(id).map(|s| (s.time_range(), s.capacity)),
            SlotRef::Shift(id) => self
                .shift(id)
                .map(|s| (s.time_range(), s.max_volunteers)),
        }
    }

    /// The holiday falling on `date`, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&str> {
        self.overrides.iter().find_map(|o| match o {
            AvailabilityOverride::Holiday { date: d, reason } if *d == date => {
                Some(reason.as_str())
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = TimeRange::new(t(9, 0), t(10, 0));
        let b = TimeRange::new(t(10, 0), t(11, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn one_minute_overlap_conflicts() {
        let a = TimeRange::new(t(9, 0), t(10, 1));
        let b = TimeRange::new(t(10, 0), t(11, 0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn contained_range_overlaps() {
        let outer = TimeRange::new(t(9, 0), t(12, 0));
        let inner = TimeRange::new(t(10, 0), t(11, 0));
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn weekday_numbers_start_on_sunday() {
        // 2024-05-05 is a Sunday, 2024-05-06 a Monday.
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()), 0);
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()), 1);
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()), 6);
    }

    #[test]
    fn category_match_ignores_case() {
        let shift = VolunteerRoleShift {
            shift_id: 1,
            role_id: 1,
            role_name: "Event Helper".into(),
            categories: vec!["Special Events".into()],
            start_time: t(9, 0),
            end_time: t(12, 0),
            max_volunteers: 4,
        };
        assert!(shift.in_any_category(&["special events".to_string()]));
        assert!(!shift.in_any_category(&["Gardening".to_string()]));
    }

    #[test]
    fn resolve_returns_capacity() {
        let catalog = Catalog {
            slots: vec![Slot {
                id: 3,
                start_time: t(9, 0),
                end_time: t(9, 30),
                capacity: 5,
            }],
            ..Default::default()
        };
        let (range, cap) = catalog.resolve(SlotRef::Shopper(3)).unwrap();
        assert_eq!(range.start, t(9, 0));
        assert_eq!(cap, 5);
        assert!(catalog.resolve(SlotRef::Shift(3)).is_none());
    }
}
