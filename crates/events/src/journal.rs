//! Structured-log subscriber for booking events.
//!
//! [`EventJournal`] drains the bus and emits one `tracing` record per event
//! so every ledger mutation leaves an audit line even when no external
//! notification collaborator is attached.

use tokio::sync::broadcast;

use crate::bus::BookingEvent;

/// Background service that logs every booking event.
pub struct EventJournal;

impl EventJournal {
    /// Run the journal loop until the bus is dropped.
    pub async fn run(mut receiver: broadcast::Receiver<BookingEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Self::record(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event journal lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, journal shutting down");
                    break;
                }
            }
        }
    }

    fn record(event: &BookingEvent) {
        tracing::info!(
            event_type = %event.event_type,
            kind = %event.kind,
            entity_id = event.entity_id,
            subject = ?event.subject,
            "Booking event"
        );
    }
}
