//! Same-subject overlap detection and the keep/replace decision.
//!
//! The ledger never resolves a conflict on its own: both candidates are
//! surfaced so a person can choose.

use serde::{Deserialize, Serialize};

use crate::booking::{Booking, BookingKind, RequestDescriptor, SlotRef};
use crate::catalog::{Catalog, TimeRange};
use crate::types::DbId;

/// Caller's explicit answer to a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictChoice {
    /// Abort the new request; nothing changes.
    KeepExisting,
    /// Cancel the existing booking and commit the new one as one unit.
    ReplaceWithNew,
}

/// Both candidates of a detected conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub existing: Booking,
    pub attempted: RequestDescriptor,
}

/// Find the first of `held` that overlaps `requested` on the same date.
///
/// Only live bookings are considered; `exclude` skips the booking being
/// rescheduled. Bookings whose slot is no longer in the catalog cannot be
/// placed in time and are ignored.
pub fn find_overlap<'a>(
    catalog: &Catalog,
    held: &'a [Booking],
    requested: &RequestDescriptor,
    exclude: Option<DbId>,
) -> Option<&'a Booking> {
    let wanted = TimeRange::new(requested.start_time, requested.end_time);
    held.iter()
        .filter(|b| b.is_active())
        .filter(|b| b.subject == requested.request.subject)
        .filter(|b| b.date == requested.request.date)
        .filter(|b| Some(b.id) != exclude)
        .find(|b| {
            catalog
                .resolve(b.target)
                .is_some_and(|(range, _)| range.overlaps(&wanted))
        })
}

/// Every target of the requested ledger whose time range overlaps the
/// request, including the requested target itself.
///
/// Stores re-check a subject's live bookings against this set while holding
/// the subject's per-date lock.
pub fn overlapping_targets(catalog: &Catalog, requested: &RequestDescriptor) -> Vec<SlotRef> {
    let wanted = TimeRange::new(requested.start_time, requested.end_time);
    let mut targets: Vec<SlotRef> = match requested.request.target.kind() {
        BookingKind::Shopper => catalog
            .slots
            .iter()
            .filter(|s| s.time_range().overlaps(&wanted))
            .map(|s| SlotRef::Shopper(s.id))
            .collect(),
        BookingKind::Volunteer => catalog
            .shifts
            .iter()
            .filter(|s| s.time_range().overlaps(&wanted))
            .map(|s| SlotRef::Shift(s.shift_id))
            .collect(),
    };
    if !targets.contains(&requested.request.target) {
        targets.push(requested.request.target);
    }
    targets
}

/// The first live booking in `held` sitting on one of `targets`, other than
/// `exclude`.
pub fn first_on_targets(
    held: Vec<Booking>,
    targets: &[SlotRef],
    exclude: Option<DbId>,
) -> Option<Booking> {
    held.into_iter()
        .filter(|b| b.is_active() && Some(b.id) != exclude)
        .find(|b| targets.contains(&b.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookedBy, BookingRequest, Subject};
    use crate::catalog::VolunteerRoleShift;
    use crate::status::BookingStatus;
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn shift(id: DbId, start: NaiveTime, end: NaiveTime) -> VolunteerRoleShift {
        VolunteerRoleShift {
            shift_id: id,
            role_id: id,
            role_name: format!("role {id}"),
            categories: vec![],
            start_time: start,
            end_time: end,
            max_volunteers: 5,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            shifts: vec![
                shift(1, t(9, 0), t(10, 0)),
                shift(2, t(9, 0), t(10, 1)),
                shift(3, t(9, 0), t(12, 0)),
            ],
            ..Default::default()
        }
    }

    fn booking(id: DbId, shift_id: DbId, status: BookingStatus) -> Booking {
        Booking {
            id,
            subject: Subject::Volunteer(7),
            target: SlotRef::Shift(shift_id),
            date: date(),
            status,
            note: None,
            staff_note: None,
            reason: None,
            recurring_id: None,
            reschedule_token: format!("tok{id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(start: NaiveTime, end: NaiveTime) -> RequestDescriptor {
        RequestDescriptor {
            request: BookingRequest {
                subject: Subject::Volunteer(7),
                target: SlotRef::Shift(99),
                date: date(),
                note: None,
                booked_by: BookedBy::SelfService,
            },
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn ending_at_ten_does_not_conflict_with_ten_start() {
        let held = vec![booking(1, 1, BookingStatus::Approved)];
        assert!(find_overlap(&catalog(), &held, &request(t(10, 0), t(11, 0)), None).is_none());
    }

    #[test]
    fn ending_at_ten_oh_one_conflicts() {
        let held = vec![booking(1, 2, BookingStatus::Approved)];
        let hit = find_overlap(&catalog(), &held, &request(t(10, 0), t(11, 0)), None);
        assert_eq!(hit.map(|b| b.id), Some(1));
    }

    #[test]
    fn terminal_bookings_ignored() {
        let held = vec![booking(1, 3, BookingStatus::Cancelled)];
        assert!(find_overlap(&catalog(), &held, &request(t(11, 0), t(13, 0)), None).is_none());
    }

    #[test]
    fn excluded_booking_ignored() {
        let held = vec![booking(1, 3, BookingStatus::Pending)];
        assert!(find_overlap(&catalog(), &held, &request(t(11, 0), t(13, 0)), Some(1)).is_none());
        assert!(find_overlap(&catalog(), &held, &request(t(11, 0), t(13, 0)), None).is_some());
    }

    #[test]
    fn other_dates_ignored() {
        let mut other = booking(1, 3, BookingStatus::Approved);
        other.date = date().succ_opt().unwrap();
        assert!(find_overlap(&catalog(), &[other], &request(t(11, 0), t(13, 0)), None).is_none());
    }

    #[test]
    fn overlapping_targets_use_half_open_ranges() {
        let mut catalog = catalog();
        catalog.shifts.push(shift(4, t(10, 0), t(11, 0)));
        let mut wanted = request(t(10, 0), t(11, 0));
        wanted.request.target = SlotRef::Shift(4);

        let targets = overlapping_targets(&catalog, &wanted);
        assert!(targets.contains(&SlotRef::Shift(2)));
        assert!(targets.contains(&SlotRef::Shift(3)));
        assert!(targets.contains(&SlotRef::Shift(4)));
        assert!(!targets.contains(&SlotRef::Shift(1)));
    }

    #[test]
    fn first_on_targets_skips_excluded_and_terminal() {
        let held = vec![
            booking(1, 3, BookingStatus::Cancelled),
            booking(2, 3, BookingStatus::Approved),
            booking(3, 3, BookingStatus::Pending),
        ];
        let targets = [SlotRef::Shift(3)];
        assert_eq!(first_on_targets(held.clone(), &targets, Some(2)).map(|b| b.id), Some(3));
        assert!(first_on_targets(held, &[SlotRef::Shift(1)], None).is_none());
    }
}
