#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use pantry_core::booking::{BookedBy, Booking, BookingRequest, SlotRef, Subject};
use pantry_core::catalog::{Catalog, Slot, VolunteerRoleShift};
use pantry_core::types::DbId;
use pantry_events::EventBus;
use pantry_scheduler::{BookOutcome, BookingEngine, FixedClock, MemoryStore, SchedulerConfig};

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 06:00 UTC on the given day, before any slot opens.
pub fn morning_of(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(t(6, 0)))
}

fn shift(
    shift_id: DbId,
    role_id: DbId,
    name: &str,
    category: &str,
    start: NaiveTime,
    end: NaiveTime,
    max: i32,
) -> VolunteerRoleShift {
    VolunteerRoleShift {
        shift_id,
        role_id,
        role_name: name.to_string(),
        categories: vec![category.to_string()],
        start_time: start,
        end_time: end,
        max_volunteers: max,
    }
}

/// Shopper slots 1 (one seat), 2 and 3; volunteer shifts for four roles.
pub fn catalog() -> Catalog {
    Catalog {
        slots: vec![
            Slot { id: 1, start_time: t(9, 0), end_time: t(9, 30), capacity: 1 },
            Slot { id: 2, start_time: t(10, 0), end_time: t(10, 30), capacity: 4 },
            Slot { id: 3, start_time: t(13, 0), end_time: t(13, 30), capacity: 4 },
        ],
        shifts: vec![
            shift(10, 1, "Pantry Helper", "Pantry", t(9, 0), t(12, 0), 3),
            shift(20, 2, "Warehouse Sorter", "Warehouse", t(11, 0), t(13, 0), 2),
            shift(30, 3, "Event Helper", "Special Events", t(13, 0), t(16, 0), 10),
            shift(40, 4, "Driver", "Delivery", t(12, 0), t(14, 0), 1),
        ],
        overrides: vec![],
    }
}

pub struct Harness {
    pub engine: Arc<BookingEngine>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub events: Arc<EventBus>,
}

/// Engine over a fresh [`MemoryStore`], with the clock at `now` in UTC.
pub fn harness(now: DateTime<Utc>) -> Harness {
    let store = Arc::new(MemoryStore::new(catalog()));
    let clock = Arc::new(FixedClock::new(now));
    let events = Arc::new(EventBus::default());
    let config = SchedulerConfig {
        timezone: chrono_tz::UTC,
        ..Default::default()
    };
    let engine = Arc::new(BookingEngine::new(
        store.clone(),
        events.clone(),
        clock.clone(),
        config,
    ));
    Harness {
        engine,
        store,
        clock,
        events,
    }
}

pub fn shopper(client_id: DbId, slot_id: DbId, date: NaiveDate) -> BookingRequest {
    BookingRequest {
        subject: Subject::Client(client_id),
        target: SlotRef::Shopper(slot_id),
        date,
        note: None,
        booked_by: BookedBy::SelfService,
    }
}

pub fn volunteer(volunteer_id: DbId, shift_id: DbId, date: NaiveDate) -> BookingRequest {
    BookingRequest {
        subject: Subject::Volunteer(volunteer_id),
        target: SlotRef::Shift(shift_id),
        date,
        note: None,
        booked_by: BookedBy::SelfService,
    }
}

pub fn staff_assigned(mut request: BookingRequest) -> BookingRequest {
    request.booked_by = BookedBy::Staff;
    request
}

/// Book and expect success.
pub async fn book_ok(engine: &BookingEngine, request: BookingRequest) -> Booking {
    match engine.book(request).await {
        Ok(BookOutcome::Booked { booking }) => booking,
        other => panic!("expected a booking, got {other:?}"),
    }
}
