//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`BookingEvent`]s. It is
//! shared via `Arc<EventBus>` between the engine and its subscribers.

use chrono::{DateTime, Utc};
use pantry_core::booking::{Booking, BookingKind, Subject};
use pantry_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const BOOKING_CREATED: &str = "booking.created";
pub const BOOKING_CANCELLED: &str = "booking.cancelled";
pub const BOOKING_RESCHEDULED: &str = "booking.rescheduled";
pub const BOOKING_VISITED: &str = "booking.visited";
pub const BOOKING_NO_SHOW: &str = "booking.no_show";
pub const BOOKING_APPROVED: &str = "booking.approved";
pub const BOOKING_REJECTED: &str = "booking.rejected";
pub const BOOKING_EXPIRED: &str = "booking.expired";
pub const SERIES_CANCELLED: &str = "series.cancelled";

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// Something that happened to a booking or series.
///
/// Constructed via [`BookingEvent::for_booking`] or
/// [`BookingEvent::for_series`] and enriched with
/// [`with_payload`](BookingEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Dot-separated event name, e.g. `"booking.created"`.
    pub event_type: String,

    pub kind: BookingKind,

    /// Booking id, or series id for `series.*` events.
    pub entity_id: DbId,

    pub subject: Option<Subject>,

    /// Event-specific data (booking snapshot, visit metadata, counts).
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    /// Event about one booking, carrying a snapshot of it as payload.
    pub fn for_booking(event_type: impl Into<String>, booking: &Booking) -> Self {
        Self {
            event_type: event_type.into(),
            kind: booking.kind(),
            entity_id: booking.id,
            subject: Some(booking.subject),
            payload: serde_json::json!({ "booking": booking }),
            timestamp: Utc::now(),
        }
    }

    /// Event about a recurring series.
    pub fn for_series(event_type: impl Into<String>, series_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            kind: BookingKind::Volunteer,
            entity_id: series_id,
            subject: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Merge `extra` object keys into the payload.
    pub fn with_payload(mut self, extra: serde_json::Value) -> Self {
        match (&mut self.payload, extra) {
            (serde_json::Value::Object(base), serde_json::Value::Object(extra)) => {
                base.extend(extra);
            }
            (_, extra) => self.payload = extra,
        }
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: BookingEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pantry_core::booking::SlotRef;
    use pantry_core::status::BookingStatus;

    fn booking() -> Booking {
        Booking {
            id: 42,
            subject: Subject::Client(7),
            target: SlotRef::Shopper(1),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: BookingStatus::Approved,
            note: None,
            staff_note: None,
            reason: None,
            recurring_id: None,
            reschedule_token: "t".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            BookingEvent::for_booking(BOOKING_CREATED, &booking())
                .with_payload(serde_json::json!({ "weight_kg": 12 })),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, BOOKING_CREATED);
        assert_eq!(received.entity_id, 42);
        assert_eq!(received.kind, BookingKind::Shopper);
        assert_eq!(received.payload["weight_kg"], 12);
        assert_eq!(received.payload["booking"]["id"], 42);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BookingEvent::for_series(SERIES_CANCELLED, 5));

        assert_eq!(rx1.recv().await.unwrap().entity_id, 5);
        assert_eq!(rx2.recv().await.unwrap().entity_id, 5);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(BookingEvent::for_series(SERIES_CANCELLED, 1));
    }

    #[test]
    fn non_object_payload_replaces() {
        let event = BookingEvent::for_series(SERIES_CANCELLED, 1)
            .with_payload(serde_json::json!([1, 2]));
        assert!(event.payload.is_array());
    }
}
