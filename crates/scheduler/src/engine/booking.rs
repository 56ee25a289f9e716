//! Claiming seats: book, conflict resolution and reschedule.

use chrono::NaiveDate;
use pantry_core::availability::{check_bookable, Bookable};
use pantry_core::booking::{BookedBy, Booking, BookingHandle, BookingRequest, RequestDescriptor, SlotRef};
use pantry_core::catalog::Catalog;
use pantry_core::conflict::{find_overlap, overlapping_targets, Conflict, ConflictChoice};
use pantry_core::error::{BookingError, BookingResult};
use pantry_core::status::{initial_status, state_machine, BookingStatus};
use pantry_core::store::{Claim, ClaimOutcome, Relocation};
use pantry_core::token::generate_reschedule_token;
use pantry_core::types::DbId;
use pantry_events::{bus, BookingEvent};
use serde::Serialize;

use super::BookingEngine;

/// Result of a booking attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookOutcome {
    Booked { booking: Booking },
    /// The subject already holds an overlapping live booking. Nothing was
    /// written; resubmit with a [`ConflictChoice`].
    Conflict { conflict: Conflict },
}

impl BookingEngine {
    /// Check the target is open, then the subject's overlaps, then claim.
    pub async fn book(&self, request: BookingRequest) -> BookingResult<BookOutcome> {
        validate_kinds(&request)?;
        let catalog = self.catalog().await?;
        let bookable = self.bookable(&catalog, request.target, request.date)?;
        let attempted = describe(request, &bookable);

        let held = self
            .store
            .active_for_subject(attempted.request.subject, attempted.request.date)
            .await?;
        if let Some(existing) = find_overlap(&catalog, &held, &attempted, None) {
            tracing::info!(
                subject = %attempted.request.subject,
                existing_id = existing.id,
                slot = %attempted.request.target,
                date = %attempted.request.date,
                "Booking conflicts with existing booking",
            );
            return Ok(BookOutcome::Conflict {
                conflict: Conflict {
                    existing: existing.clone(),
                    attempted,
                },
            });
        }

        let status = initial_status(
            attempted.request.subject.kind(),
            attempted.request.booked_by == BookedBy::Staff,
        );
        match self.claim_seat(&catalog, &attempted, &bookable, status, None).await {
            Ok(booking) => Ok(BookOutcome::Booked { booking }),
            // An overlapping booking committed between the check and the claim.
            Err(BookingError::DuplicateActiveBooking { existing, attempted }) => {
                Ok(BookOutcome::Conflict {
                    conflict: Conflict {
                        existing: *existing,
                        attempted: *attempted,
                    },
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Apply the caller's choice to a conflict reported by [`book`](Self::book).
    ///
    /// `ReplaceWithNew` cancels `existing_id` and commits the new request in
    /// one store unit; if either half fails neither applies. A replacement
    /// volunteer booking inherits an approved status from the booking it
    /// replaces.
    pub async fn resolve_conflict(
        &self,
        existing_id: DbId,
        attempted: BookingRequest,
        choice: ConflictChoice,
    ) -> BookingResult<Booking> {
        validate_kinds(&attempted)?;
        let kind = attempted.subject.kind();
        let existing = self
            .store
            .find(kind, existing_id)
            .await?
            .filter(|b| b.subject == attempted.subject)
            .ok_or_else(|| BookingError::not_found("Booking", existing_id))?;

        if choice == ConflictChoice::KeepExisting {
            tracing::info!(booking_id = existing.id, "Conflict resolved: keeping existing booking");
            return Ok(existing);
        }

        if !existing.is_active() {
            return Err(BookingError::InvalidTransition {
                from: existing.status,
                to: BookingStatus::Cancelled,
            });
        }

        let catalog = self.catalog().await?;
        let bookable = self.bookable(&catalog, attempted.target, attempted.date)?;
        let attempted = describe(attempted, &bookable);

        // Replacing one booking must not leave a second overlap behind.
        let held = self
            .store
            .active_for_subject(attempted.request.subject, attempted.request.date)
            .await?;
        if let Some(other) = find_overlap(&catalog, &held, &attempted, Some(existing.id)) {
            return Err(BookingError::DuplicateActiveBooking {
                existing: Box::new(other.clone()),
                attempted: Box::new(attempted),
            });
        }

        let staff = attempted.request.booked_by == BookedBy::Staff;
        let status = match initial_status(kind, staff) {
            BookingStatus::Pending if existing.status == BookingStatus::Approved => {
                BookingStatus::Approved
            }
            status => status,
        };

        let booking = self
            .claim_seat(&catalog, &attempted, &bookable, status, Some(&existing))
            .await?;
        tracing::info!(
            replaced_id = existing.id,
            booking_id = booking.id,
            "Conflict resolved: replaced existing booking",
        );
        Ok(booking)
    }

    /// Move a live booking to another target and/or date of the same ledger.
    ///
    /// Capacity is re-checked on the destination. The source seat frees in
    /// the same store unit, and the token and status carry over.
    pub async fn reschedule(
        &self,
        handle: &BookingHandle,
        target: SlotRef,
        date: NaiveDate,
    ) -> BookingResult<Booking> {
        let booking = self.find(handle).await?;
        let kind = booking.kind();

        if !state_machine::can_reschedule(kind, booking.status) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: booking.status,
            });
        }
        if target.kind() != kind {
            return Err(BookingError::Invalid(format!(
                "cannot move a {kind} booking to {target}"
            )));
        }

        let catalog = self.catalog().await?;
        let bookable = self.bookable(&catalog, target, date)?;
        if booking.target == target && booking.date == date {
            return Ok(booking);
        }

        let attempted = describe(
            BookingRequest {
                subject: booking.subject,
                target,
                date,
                note: booking.note.clone(),
                booked_by: BookedBy::SelfService,
            },
            &bookable,
        );
        let held = self.store.active_for_subject(booking.subject, date).await?;
        if let Some(existing) = find_overlap(&catalog, &held, &attempted, Some(booking.id)) {
            return Err(BookingError::DuplicateActiveBooking {
                existing: Box::new(existing.clone()),
                attempted: Box::new(attempted),
            });
        }

        let outcome = self
            .store
            .relocate(Relocation {
                kind,
                id: booking.id,
                subject: booking.subject,
                expected_status: booking.status,
                target,
                date,
                capacity: bookable.capacity,
                overlapping: overlapping_targets(&catalog, &attempted),
            })
            .await?;

        match outcome {
            ClaimOutcome::Claimed(moved) => {
                tracing::info!(
                    booking_id = moved.id,
                    kind = %kind,
                    from_target = %booking.target,
                    from_date = %booking.date,
                    to_target = %moved.target,
                    to_date = %moved.date,
                    "Booking rescheduled",
                );
                self.publish(
                    BookingEvent::for_booking(bus::BOOKING_RESCHEDULED, &moved).with_payload(
                        serde_json::json!({
                            "from": { "target": booking.target, "date": booking.date },
                        }),
                    ),
                );
                Ok(moved)
            }
            ClaimOutcome::Full => Err(BookingError::SlotFull { target, date }),
            ClaimOutcome::Overlap(existing) => Err(BookingError::DuplicateActiveBooking {
                existing: Box::new(existing),
                attempted: Box::new(attempted),
            }),
            ClaimOutcome::Stale(current) => Err(stale(booking, current)),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    pub(super) fn bookable(
        &self,
        catalog: &Catalog,
        target: SlotRef,
        date: NaiveDate,
    ) -> BookingResult<Bookable> {
        check_bookable(
            catalog,
            target,
            date,
            self.local_now(),
            &self.config.always_open_categories,
        )
    }

    /// Claim one seat for an already-validated request.
    pub(super) async fn claim_seat(
        &self,
        catalog: &Catalog,
        attempted: &RequestDescriptor,
        bookable: &Bookable,
        status: BookingStatus,
        replaces: Option<&Booking>,
    ) -> BookingResult<Booking> {
        self.claim_seat_in_series(catalog, attempted, bookable, status, replaces, None)
            .await
    }

    pub(super) async fn claim_seat_in_series(
        &self,
        catalog: &Catalog,
        attempted: &RequestDescriptor,
        bookable: &Bookable,
        status: BookingStatus,
        replaces: Option<&Booking>,
        recurring_id: Option<DbId>,
    ) -> BookingResult<Booking> {
        let request = &attempted.request;
        let outcome = self
            .store
            .claim(Claim {
                subject: request.subject,
                target: request.target,
                date: request.date,
                capacity: bookable.capacity,
                status,
                note: request.note.clone(),
                recurring_id,
                reschedule_token: generate_reschedule_token(),
                replaces: replaces.map(|b| b.id),
                overlapping: overlapping_targets(catalog, attempted),
            })
            .await?;

        match outcome {
            ClaimOutcome::Claimed(booking) => {
                if let Some(old) = replaces {
                    let cancelled = self
                        .store
                        .find(old.kind(), old.id)
                        .await?
                        .unwrap_or_else(|| old.clone());
                    self.publish(
                        BookingEvent::for_booking(bus::BOOKING_CANCELLED, &cancelled)
                            .with_payload(serde_json::json!({ "replaced_by": booking.id })),
                    );
                }
                tracing::info!(
                    booking_id = booking.id,
                    subject = %booking.subject,
                    slot = %booking.target,
                    date = %booking.date,
                    status = %booking.status,
                    "Booking created",
                );
                self.publish(BookingEvent::for_booking(bus::BOOKING_CREATED, &booking));
                Ok(booking)
            }
            ClaimOutcome::Full => {
                tracing::debug!(slot = %request.target, date = %request.date, "Slot full at claim");
                Err(BookingError::SlotFull {
                    target: request.target,
                    date: request.date,
                })
            }
            ClaimOutcome::Overlap(existing) => {
                tracing::info!(
                    subject = %request.subject,
                    existing_id = existing.id,
                    "Overlapping booking committed concurrently",
                );
                Err(BookingError::DuplicateActiveBooking {
                    existing: Box::new(existing),
                    attempted: Box::new(attempted.clone()),
                })
            }
            ClaimOutcome::Stale(current) => match replaces {
                Some(old) => Err(stale(old.clone(), current)),
                None => Err(BookingError::Storage("claim reported a stale booking".into())),
            },
        }
    }
}

fn validate_kinds(request: &BookingRequest) -> BookingResult<()> {
    if request.subject.kind() != request.target.kind() {
        return Err(BookingError::Invalid(format!(
            "{} cannot book {}",
            request.subject, request.target
        )));
    }
    Ok(())
}

fn describe(request: BookingRequest, bookable: &Bookable) -> RequestDescriptor {
    RequestDescriptor {
        request,
        start_time: bookable.range.start,
        end_time: bookable.range.end,
    }
}

/// Error for a booking that changed under a concurrent writer.
pub(super) fn stale(expected: Booking, current: Option<Booking>) -> BookingError {
    match current {
        Some(now) => BookingError::InvalidTransition {
            from: now.status,
            to: expected.status,
        },
        None => BookingError::not_found("Booking", expected.id),
    }
}
