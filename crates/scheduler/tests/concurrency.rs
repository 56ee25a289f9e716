//! Parallel claims against one slot never exceed its capacity, and one
//! person's parallel requests never leave two overlapping bookings.

mod common;

use assert_matches::assert_matches;
use pantry_core::booking::{BookingHandle, BookingKind, SlotRef, Subject};
use pantry_core::error::BookingError;
use pantry_core::store::BookingStore;
use pantry_scheduler::BookOutcome;

use common::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_bookings_fill_exactly_to_capacity() {
    let date = d(2024, 5, 7);
    let h = harness(morning_of(date));

    let mut tasks = Vec::new();
    for client in 1..=20 {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.book(shopper(client, 2, date)).await
        }));
    }

    let mut booked = 0;
    let mut full = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(BookOutcome::Booked { .. }) => booked += 1,
            Err(BookingError::SlotFull { .. }) => full += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert_eq!(booked, 4);
    assert_eq!(full, 16);

    let counts = h.store.occupancy(BookingKind::Shopper, date).await.unwrap();
    assert_eq!(counts.get(&SlotRef::Shopper(2)), Some(&4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_reschedules_into_last_seat() {
    let date = d(2024, 5, 7);
    let h = harness(morning_of(date));

    let mut handles = Vec::new();
    for client in 1..=4 {
        let b = book_ok(&h.engine, shopper(client, 3, date)).await;
        handles.push(BookingHandle::Token(b.reschedule_token));
    }

    let mut tasks = Vec::new();
    for handle in handles {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.reschedule(&handle, SlotRef::Shopper(1), date).await
        }));
    }

    let mut moved = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => moved += 1,
            Err(e) => assert_matches!(e, BookingError::SlotFull { .. }),
        }
    }
    assert_eq!(moved, 1);

    let counts = h.store.occupancy(BookingKind::Shopper, date).await.unwrap();
    assert_eq!(counts.get(&SlotRef::Shopper(1)), Some(&1));
    assert_eq!(counts.get(&SlotRef::Shopper(3)), Some(&3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_cancels_of_one_booking_all_succeed() {
    let date = d(2024, 5, 7);
    let h = harness(morning_of(date));
    let booking = book_ok(&h.engine, shopper(1, 2, date)).await;
    let mut rx = h.events.subscribe();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let engine = h.engine.clone();
        let handle = BookingHandle::Id(BookingKind::Shopper, booking.id);
        tasks.push(tokio::spawn(async move { engine.cancel(&handle, None).await }));
    }
    for task in tasks {
        let cancelled = task.await.unwrap().unwrap();
        assert_eq!(cancelled.id, booking.id);
    }

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_overlapping_shifts_for_one_volunteer_book_once() {
    let date = d(2024, 5, 7);
    for _ in 0..100 {
        let h = harness(morning_of(date));

        // Pantry Helper 09:00-12:00 and Warehouse Sorter 11:00-13:00.
        let tasks: Vec<_> = [10, 20]
            .into_iter()
            .map(|shift_id| {
                let engine = h.engine.clone();
                tokio::spawn(async move { engine.book(volunteer(7, shift_id, date)).await })
            })
            .collect();

        let mut booked = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(BookOutcome::Booked { .. }) => booked += 1,
                Ok(BookOutcome::Conflict { conflict }) => {
                    assert_eq!(conflict.existing.subject, Subject::Volunteer(7));
                    conflicts += 1;
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!((booked, conflicts), (1, 1));

        let held = h
            .store
            .active_for_subject(Subject::Volunteer(7), date)
            .await
            .unwrap();
        assert_eq!(held.len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_reschedule_and_book_cannot_overlap() {
    let date = d(2024, 5, 7);
    let next = d(2024, 5, 8);
    for _ in 0..100 {
        let h = harness(morning_of(date));
        let moving = book_ok(&h.engine, volunteer(7, 10, next)).await;

        let engine = h.engine.clone();
        let reschedule = tokio::spawn(async move {
            let handle = BookingHandle::Id(BookingKind::Volunteer, moving.id);
            engine.reschedule(&handle, SlotRef::Shift(10), date).await
        });
        let engine = h.engine.clone();
        let book = tokio::spawn(async move { engine.book(volunteer(7, 20, date)).await });

        let moved = match reschedule.await.unwrap() {
            Ok(_) => true,
            Err(e) => {
                assert_matches!(e, BookingError::DuplicateActiveBooking { .. });
                false
            }
        };
        let booked = match book.await.unwrap() {
            Ok(BookOutcome::Booked { .. }) => true,
            Ok(BookOutcome::Conflict { .. }) => false,
            other => panic!("unexpected outcome {other:?}"),
        };
        assert!(moved ^ booked, "exactly one of the overlapping requests must win");

        let held = h
            .store
            .active_for_subject(Subject::Volunteer(7), date)
            .await
            .unwrap();
        assert_eq!(held.len(), 1);
    }
}
