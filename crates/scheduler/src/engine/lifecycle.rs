//! Status transitions after a booking exists, and read-side listings.

use chrono::NaiveDate;
use pantry_core::booking::{Booking, BookingHandle, BookingKind, Outcome, ReviewDecision, Subject};
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::status::{state_machine, BookingStatus};
use pantry_core::store::StatusChange;
use pantry_events::{bus, BookingEvent};

use super::BookingEngine;

impl BookingEngine {
    /// Cancel a live booking, freeing its seat.
    ///
    /// Cancelling an already-cancelled booking returns it unchanged and
    /// emits nothing. Any other terminal status is an invalid transition.
    pub async fn cancel(
        &self,
        handle: &BookingHandle,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        let booking = self.find(handle).await?;
        if booking.status == BookingStatus::Cancelled {
            tracing::debug!(booking_id = booking.id, "Cancel of cancelled booking ignored");
            return Ok(booking);
        }

        match self
            .apply(&booking, BookingStatus::Cancelled, reason, bus::BOOKING_CANCELLED, None)
            .await
        {
            // Lost a race with another cancel: same end state.
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Cancelled,
                ..
            }) => self.find(handle).await,
            other => other,
        }
    }

    /// Record whether an approved booking was attended.
    ///
    /// `metadata` (visit details, weights, ...) rides along on the event for
    /// the visit-record collaborator and is not stored here.
    pub async fn mark_outcome(
        &self,
        handle: &BookingHandle,
        outcome: Outcome,
        reason: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> BookingResult<Booking> {
        let booking = self.find(handle).await?;
        let to = outcome.status_for(booking.kind());
        let event_type = match outcome {
            Outcome::Visited => bus::BOOKING_VISITED,
            Outcome::NoShow => bus::BOOKING_NO_SHOW,
        };
        let extra = metadata.map(|m| serde_json::json!({ "metadata": m }));
        self.apply(&booking, to, reason, event_type, extra).await
    }

    /// Approve or reject a pending volunteer booking.
    ///
    /// Pending bookings already hold their seat, so approval needs no
    /// capacity re-check.
    pub async fn review(
        &self,
        handle: &BookingHandle,
        decision: ReviewDecision,
        reason: Option<String>,
    ) -> BookingResult<Booking> {
        let booking = self.find(handle).await?;
        if booking.kind() != BookingKind::Volunteer {
            return Err(BookingError::Invalid(
                "only volunteer bookings are reviewed".into(),
            ));
        }
        let (to, event_type) = match decision {
            ReviewDecision::Approve => (BookingStatus::Approved, bus::BOOKING_APPROVED),
            ReviewDecision::Reject => (BookingStatus::Rejected, bus::BOOKING_REJECTED),
        };
        self.apply(&booking, to, reason, event_type, None).await
    }

    /// Lapse an unused booking (shopper approved, volunteer pending).
    pub async fn expire(&self, handle: &BookingHandle) -> BookingResult<Booking> {
        let booking = self.find(handle).await?;
        self.apply(&booking, BookingStatus::Expired, None, bus::BOOKING_EXPIRED, None)
            .await
    }

    /// A subject's bookings dated `from` (default today) or later.
    pub async fn list_for_subject(
        &self,
        subject: Subject,
        from: Option<NaiveDate>,
    ) -> BookingResult<Vec<Booking>> {
        let from = from.unwrap_or_else(|| self.today());
        self.store.list_for_subject(subject, from).await
    }

    /// Every booking of one ledger on `date`, ordered by slot start time.
    pub async fn list_for_date(
        &self,
        kind: BookingKind,
        date: NaiveDate,
    ) -> BookingResult<Vec<Booking>> {
        let catalog = self.catalog().await?;
        let mut rows = self.store.list_for_date(kind, date).await?;
        rows.sort_by_key(|b| (catalog.resolve(b.target).map(|(r, _)| r.start), b.id));
        Ok(rows)
    }

    /// Validate against the transition table, then compare-and-set.
    pub(super) async fn apply(
        &self,
        booking: &Booking,
        to: BookingStatus,
        reason: Option<String>,
        event_type: &str,
        extra: Option<serde_json::Value>,
    ) -> BookingResult<Booking> {
        let kind = booking.kind();
        if !state_machine::can_transition(kind, booking.status, to) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to,
            });
        }

        let updated = self
            .store
            .transition(StatusChange {
                kind,
                id: booking.id,
                from: booking.status,
                to,
                reason,
            })
            .await?;

        let Some(updated) = updated else {
            // Status moved underneath us; report what it is now.
            let current = self.store.find(kind, booking.id).await?;
            return Err(match current {
                Some(now) => BookingError::InvalidTransition {
                    from: now.status,
                    to,
                },
                None => BookingError::not_found("Booking", booking.id),
            });
        };

        tracing::info!(
            booking_id = updated.id,
            kind = %kind,
            from = %booking.status,
            to = %updated.status,
            "Booking status changed",
        );
        let mut event = BookingEvent::for_booking(event_type, &updated);
        if let Some(extra) = extra {
            event = event.with_payload(extra);
        }
        self.publish(event);
        Ok(updated)
    }
}
