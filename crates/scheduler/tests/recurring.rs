//! Recurring volunteer series.

mod common;

use assert_matches::assert_matches;
use pantry_core::availability::{PAST_REASON, WEEKEND_REASON};
use pantry_core::booking::{BookedBy, BookingHandle, BookingKind};
use pantry_core::catalog::AvailabilityOverride;
use pantry_core::error::BookingError;
use pantry_core::recurrence::RecurrenceRule;
use pantry_core::status::BookingStatus;
use pantry_events::bus;

use common::*;

#[tokio::test]
async fn daily_series_skips_weekend_and_holiday_with_reasons() {
    let anchor = d(2024, 5, 16); // Thursday
    let h = harness(morning_of(anchor));
    h.store
        .edit_catalog(|c| {
            c.overrides.push(AvailabilityOverride::Holiday {
                date: d(2024, 5, 20),
                reason: "Victoria Day".into(),
            })
        })
        .unwrap();

    let outcome = h
        .engine
        .create_recurring(1, 10, anchor, RecurrenceRule::daily(d(2024, 5, 21)), BookedBy::Staff)
        .await
        .unwrap();

    let created: Vec<_> = outcome.created.iter().map(|b| b.date).collect();
    assert_eq!(created, vec![d(2024, 5, 16), d(2024, 5, 17), d(2024, 5, 21)]);
    assert!(outcome.created.iter().all(|b| b.status == BookingStatus::Approved));

    let skipped: Vec<_> = outcome
        .skipped
        .iter()
        .map(|s| (s.date, s.code.as_str(), s.reason.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (d(2024, 5, 18), "SLOT_CLOSED", WEEKEND_REASON),
            (d(2024, 5, 19), "SLOT_CLOSED", WEEKEND_REASON),
            (d(2024, 5, 20), "SLOT_CLOSED", "Victoria Day"),
        ]
    );
}

#[tokio::test]
async fn full_and_conflicting_dates_are_skipped() {
    let anchor = d(2024, 5, 6);
    let h = harness(morning_of(anchor));

    // Someone else holds the only Driver seat on the 8th.
    book_ok(&h.engine, volunteer(9, 40, d(2024, 5, 8))).await;
    // Volunteer 1 already works an overlapping shift on the 13th.
    book_ok(&h.engine, volunteer(1, 20, d(2024, 5, 13))).await;

    let outcome = h
        .engine
        .create_recurring(
            1,
            40,
            anchor,
            RecurrenceRule::weekly([1, 3], d(2024, 5, 15)),
            BookedBy::SelfService,
        )
        .await
        .unwrap();

    let created: Vec<_> = outcome.created.iter().map(|b| b.date).collect();
    assert_eq!(created, vec![d(2024, 5, 6), d(2024, 5, 15)]);
    let codes: Vec<_> = outcome
        .skipped
        .iter()
        .map(|s| (s.date, s.code.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![
            (d(2024, 5, 8), "SLOT_FULL"),
            (d(2024, 5, 13), "DUPLICATE_ACTIVE_BOOKING"),
        ]
    );
}

#[tokio::test]
async fn anchor_in_the_past_skips_elapsed_dates() {
    let h = harness(morning_of(d(2024, 5, 8)));
    let outcome = h
        .engine
        .create_recurring(
            1,
            10,
            d(2024, 5, 6),
            RecurrenceRule::weekly([1, 3], d(2024, 5, 13)),
            BookedBy::SelfService,
        )
        .await
        .unwrap();
    assert_eq!(outcome.created.len(), 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].reason, PAST_REASON);
}

#[tokio::test]
async fn malformed_rules_book_nothing() {
    let h = harness(morning_of(d(2024, 5, 6)));
    assert_matches!(
        h.engine
            .create_recurring(
                1,
                10,
                d(2024, 5, 6),
                RecurrenceRule::weekly([], d(2024, 5, 31)),
                BookedBy::SelfService,
            )
            .await,
        Err(BookingError::Invalid(_))
    );
    assert_matches!(
        h.engine
            .create_recurring(
                1,
                99,
                d(2024, 5, 6),
                RecurrenceRule::daily(d(2024, 5, 31)),
                BookedBy::SelfService,
            )
            .await,
        Err(BookingError::NotFound { .. })
    );
    let sheet = h
        .engine
        .list_for_date(BookingKind::Volunteer, d(2024, 5, 6))
        .await
        .unwrap();
    assert!(sheet.is_empty());
}

#[tokio::test]
async fn cancel_series_leaves_finished_members_and_emits_summary() {
    let anchor = d(2024, 5, 6);
    let h = harness(morning_of(anchor));
    let outcome = h
        .engine
        .create_recurring(1, 10, anchor, RecurrenceRule::daily(d(2024, 5, 8)), BookedBy::Staff)
        .await
        .unwrap();
    assert_eq!(outcome.created.len(), 3);

    // The 7th was worked; the 8th was already cancelled by hand.
    h.engine
        .mark_outcome(
            &BookingHandle::Id(BookingKind::Volunteer, outcome.created[1].id),
            pantry_core::booking::Outcome::Visited,
            None,
            None,
        )
        .await
        .unwrap();
    h.engine
        .cancel(
            &BookingHandle::Id(BookingKind::Volunteer, outcome.created[2].id),
            None,
        )
        .await
        .unwrap();

    let mut rx = h.events.subscribe();
    let result = h
        .engine
        .cancel_series(outcome.series.id, Some("moved away".into()))
        .await
        .unwrap();
    assert_eq!(result.cancelled.len(), 1);
    assert_eq!(result.cancelled[0].date, anchor);
    assert_eq!(result.cancelled[0].reason.as_deref(), Some("moved away"));

    assert_eq!(rx.try_recv().unwrap().event_type, bus::BOOKING_CANCELLED);
    let summary = rx.try_recv().unwrap();
    assert_eq!(summary.event_type, bus::SERIES_CANCELLED);
    assert_eq!(summary.entity_id, outcome.series.id);
}

#[tokio::test]
async fn unknown_series_is_not_found() {
    let h = harness(morning_of(d(2024, 5, 6)));
    assert_matches!(
        h.engine.cancel_series(404, None).await,
        Err(BookingError::NotFound { .. })
    );
}
