//! Recurring volunteer series: create with per-date skips, cancel future.

use chrono::NaiveDate;
use pantry_core::booking::{
    BookedBy, Booking, BookingKind, BookingRequest, NewSeries, RecurringSeries,
    RequestDescriptor, SlotRef, Subject,
};
use pantry_core::conflict::find_overlap;
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::recurrence::{RecurrenceRule, SkippedDate};
use pantry_core::status::{initial_status, BookingStatus};
use pantry_core::store::StatusChange;
use pantry_core::types::DbId;
use pantry_events::{bus, BookingEvent};
use serde::Serialize;

use super::BookingEngine;

/// What a series creation booked and what it had to skip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringOutcome {
    pub series: RecurringSeries,
    pub created: Vec<Booking>,
    pub skipped: Vec<SkippedDate>,
}

/// Result of cancelling the rest of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesCancellation {
    pub recurring_id: DbId,
    pub cancelled: Vec<Booking>,
}

impl BookingEngine {
    /// Book `shift_id` for a volunteer on every date `rule` yields from
    /// `anchor`.
    ///
    /// Each date is attempted independently: closed, full or conflicting
    /// dates are reported in `skipped` and the rest still book. Bookings
    /// already made stay in place if a later date hits a storage error.
    pub async fn create_recurring(
        &self,
        volunteer_id: DbId,
        shift_id: DbId,
        anchor: NaiveDate,
        rule: RecurrenceRule,
        booked_by: BookedBy,
    ) -> BookingResult<RecurringOutcome> {
        rule.validate(anchor, self.config.max_recurrence_days)?;
        let catalog = self.catalog().await?;
        if catalog.shift(shift_id).is_none() {
            return Err(BookingError::not_found("VolunteerRoleShift", shift_id));
        }

        let series = self
            .store
            .create_series(NewSeries {
                volunteer_id,
                shift_id,
                start_date: anchor,
                end_date: rule.end_date,
                frequency: rule.frequency,
                weekdays: rule.weekdays.iter().copied().collect(),
            })
            .await?;

        let status = initial_status(BookingKind::Volunteer, booked_by == BookedBy::Staff);
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        for date in rule.expand(anchor) {
            let request = BookingRequest {
                subject: Subject::Volunteer(volunteer_id),
                target: SlotRef::Shift(shift_id),
                date,
                note: None,
                booked_by,
            };
            match self.book_occurrence(request, status, series.id).await {
                Ok(booking) => created.push(booking),
                Err(e) if e.is_skippable() => {
                    tracing::debug!(series_id = series.id, %date, error = %e, "Series date skipped");
                    skipped.push(SkippedDate::from_error(date, &e));
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            series_id = series.id,
            volunteer_id,
            shift_id,
            created = created.len(),
            skipped = skipped.len(),
            "Recurring series created",
        );
        Ok(RecurringOutcome {
            series,
            created,
            skipped,
        })
    }

    pub async fn series(&self, recurring_id: DbId) -> BookingResult<RecurringSeries> {
        self.store
            .find_series(recurring_id)
            .await?
            .ok_or_else(|| BookingError::not_found("RecurringSeries", recurring_id))
    }

    /// Cancel every pending or approved member dated today or later.
    /// Earlier members are left as they are.
    pub async fn cancel_series(
        &self,
        recurring_id: DbId,
        reason: Option<String>,
    ) -> BookingResult<SeriesCancellation> {
        self.series(recurring_id).await?;

        let today = self.today();
        let mut cancelled = Vec::new();
        for member in self.store.series_members(recurring_id).await? {
            if member.date < today || !member.is_active() {
                continue;
            }
            let change = StatusChange {
                kind: BookingKind::Volunteer,
                id: member.id,
                from: member.status,
                to: BookingStatus::Cancelled,
                reason: reason.clone(),
            };
            // A member that moved on concurrently is simply left alone.
            if let Some(updated) = self.store.transition(change).await? {
                self.publish(
                    BookingEvent::for_booking(bus::BOOKING_CANCELLED, &updated)
                        .with_payload(serde_json::json!({ "recurring_id": recurring_id })),
                );
                cancelled.push(updated);
            }
        }

        tracing::info!(
            series_id = recurring_id,
            cancelled = cancelled.len(),
            "Recurring series cancelled",
        );
        self.publish(
            BookingEvent::for_series(bus::SERIES_CANCELLED, recurring_id).with_payload(
                serde_json::json!({
                    "cancelled": cancelled.iter().map(|b| b.id).collect::<Vec<_>>(),
                    "from_date": today,
                }),
            ),
        );
        Ok(SeriesCancellation {
            recurring_id,
            cancelled,
        })
    }

    async fn book_occurrence(
        &self,
        request: BookingRequest,
        status: BookingStatus,
        recurring_id: DbId,
    ) -> BookingResult<Booking> {
        let catalog = self.catalog().await?;
        let bookable = self.bookable(&catalog, request.target, request.date)?;
        let attempted = RequestDescriptor {
            request,
            start_time: bookable.range.start,
            end_time: bookable.range.end,
        };

        let held = self
            .store
            .active_for_subject(attempted.request.subject, attempted.request.date)
            .await?;
        if let Some(existing) = find_overlap(&catalog, &held, &attempted, None) {
            return Err(BookingError::DuplicateActiveBooking {
                existing: Box::new(existing.clone()),
                attempted: Box::new(attempted),
            });
        }

        self.claim_seat_in_series(
            &catalog,
            &attempted,
            &bookable,
            status,
            None,
            Some(recurring_id),
        )
        .await
    }
}
