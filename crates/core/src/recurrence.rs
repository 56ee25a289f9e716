//! Recurrence expansion for volunteer series.
//!
//! Only two patterns exist: every day, or every selected weekday, each up to
//! an inclusive end date.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::booking::Frequency;
use crate::catalog::weekday_number;
use crate::error::BookingError;

/// A recurrence rule anchored by the caller at a start date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// `0 = Sunday .. 6 = Saturday`; required (non-empty) iff weekly.
    #[serde(default)]
    pub weekdays: BTreeSet<u8>,
    pub end_date: NaiveDate,
}

impl RecurrenceRule {
    pub fn daily(end_date: NaiveDate) -> Self {
        Self {
            frequency: Frequency::Daily,
            weekdays: BTreeSet::new(),
            end_date,
        }
    }

    pub fn weekly(weekdays: impl IntoIterator<Item = u8>, end_date: NaiveDate) -> Self {
        Self {
            frequency: Frequency::Weekly,
            weekdays: weekdays.into_iter().collect(),
            end_date,
        }
    }

    /// Reject malformed rules before anything is booked.
    pub fn validate(&self, anchor: NaiveDate, max_days: u32) -> Result<(), BookingError> {
        if self.end_date < anchor {
            return Err(BookingError::Invalid(format!(
                "end date {} is before start date {anchor}",
                self.end_date
            )));
        }
        if (self.end_date - anchor).num_days() > max_days as i64 {
            return Err(BookingError::Invalid(format!(
                "series may span at most {max_days} days"
            )));
        }
        match self.frequency {
            Frequency::Weekly if self.weekdays.is_empty() => Err(BookingError::Invalid(
                "weekly series requires at least one weekday".into(),
            )),
            Frequency::Weekly if self.weekdays.iter().any(|d| *d > 6) => Err(
                BookingError::Invalid("weekdays must be between 0 (Sunday) and 6".into()),
            ),
            Frequency::Daily if !self.weekdays.is_empty() => Err(BookingError::Invalid(
                "weekdays are only allowed for weekly series".into(),
            )),
            _ => Ok(()),
        }
    }

    fn includes(&self, date: NaiveDate) -> bool {
        match self.frequency {
            Frequency::Daily => true,
            Frequency::Weekly => self.weekdays.contains(&weekday_number(date)),
        }
    }

    /// Strictly increasing dates from `anchor` through `end_date` inclusive.
    pub fn expand(&self, anchor: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut date = anchor;
        while date <= self.end_date {
            if self.includes(date) {
                dates.push(date);
            }
            date += Duration::days(1);
        }
        dates
    }
}

/// An occurrence the series could not book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDate {
    pub date: NaiveDate,
    /// Machine code (`SLOT_FULL`, `SLOT_CLOSED`, `DUPLICATE_ACTIVE_BOOKING`).
    pub code: String,
    /// Lowest-level human reason (holiday name, block reason, ...).
    pub reason: String,
}

impl SkippedDate {
    pub fn from_error(date: NaiveDate, err: &BookingError) -> Self {
        let reason = match err {
            BookingError::SlotClosed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self {
            date,
            code: err.code().to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_mon_wed_over_two_weeks() {
        let rule = RecurrenceRule::weekly([1, 3], d(2024, 5, 17));
        assert_eq!(
            rule.expand(d(2024, 5, 6)),
            vec![d(2024, 5, 6), d(2024, 5, 8), d(2024, 5, 13), d(2024, 5, 15)]
        );
    }

    #[test]
    fn daily_includes_both_ends() {
        let rule = RecurrenceRule::daily(d(2024, 5, 8));
        assert_eq!(
            rule.expand(d(2024, 5, 6)),
            vec![d(2024, 5, 6), d(2024, 5, 7), d(2024, 5, 8)]
        );
    }

    #[test]
    fn anchor_not_on_selected_weekday_is_skipped() {
        // Anchor Tuesday, only Thursdays selected.
        let rule = RecurrenceRule::weekly([4], d(2024, 5, 16));
        assert_eq!(rule.expand(d(2024, 5, 7)), vec![d(2024, 5, 9), d(2024, 5, 16)]);
    }

    #[test]
    fn single_day_series() {
        let rule = RecurrenceRule::daily(d(2024, 5, 6));
        assert_eq!(rule.expand(d(2024, 5, 6)), vec![d(2024, 5, 6)]);
    }

    #[test]
    fn weekly_without_weekdays_rejected() {
        let rule = RecurrenceRule::weekly([], d(2024, 6, 1));
        assert!(matches!(
            rule.validate(d(2024, 5, 1), 366),
            Err(BookingError::Invalid(_))
        ));
    }

    #[test]
    fn end_before_anchor_rejected() {
        let rule = RecurrenceRule::daily(d(2024, 4, 30));
        assert!(rule.validate(d(2024, 5, 1), 366).is_err());
    }

    #[test]
    fn overlong_series_rejected() {
        let rule = RecurrenceRule::daily(d(2025, 6, 1));
        assert!(rule.validate(d(2024, 5, 1), 366).is_err());
        assert!(RecurrenceRule::daily(d(2024, 6, 1)).validate(d(2024, 5, 1), 366).is_ok());
    }

    #[test]
    fn out_of_range_weekday_rejected() {
        let rule = RecurrenceRule::weekly([7], d(2024, 6, 1));
        assert!(rule.validate(d(2024, 5, 1), 366).is_err());
    }

    #[test]
    fn skipped_date_uses_closure_reason() {
        let err = BookingError::SlotClosed {
            target: crate::booking::SlotRef::Shift(1),
            date: d(2024, 5, 20),
            reason: "Victoria Day".into(),
        };
        let skipped = SkippedDate::from_error(d(2024, 5, 20), &err);
        assert_eq!(skipped.code, "SLOT_CLOSED");
        assert_eq!(skipped.reason, "Victoria Day");
    }
}
