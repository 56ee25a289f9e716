//! Handlers for booking, conflict resolution and booking lifecycle.
//!
//! Bookings are addressed as `/{kind}/{id}` because shopper and volunteer
//! ids come from separate ledgers. Clients and volunteers may only touch
//! their own bookings; staff may touch any.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use pantry_core::booking::{
    BookedBy, Booking, BookingHandle, BookingKind, BookingRequest, Outcome, ReviewDecision,
    SlotRef, Subject,
};
use pantry_core::conflict::ConflictChoice;
use pantry_core::error::BookingError;
use pantry_core::roles::ROLE_AGENCY;
use pantry_core::types::DbId;
use pantry_scheduler::BookOutcome;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStaff;
use crate::query::{DaySheetParams, FromDateParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /bookings`.
///
/// `subject` defaults to the caller's own client or volunteer identity;
/// staff and agencies name the person they book for.
#[derive(Debug, Deserialize)]
pub struct CreateBookingBody {
    pub subject: Option<Subject>,
    pub target: SlotRef,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

/// Body of `POST /bookings/resolve-conflict`.
#[derive(Debug, Deserialize)]
pub struct ResolveConflictBody {
    pub existing_id: DbId,
    pub attempted: CreateBookingBody,
    pub choice: ConflictChoice,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleBody {
    pub target: SlotRef,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct OutcomeBody {
    pub outcome: Outcome,
    #[serde(default)]
    pub reason: Option<String>,
    /// Passed through to the visit-record collaborator on the event.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Booking and conflicts
// ---------------------------------------------------------------------------

/// POST /api/v1/bookings
///
/// 201 with the booking, or 409 `DUPLICATE_ACTIVE_BOOKING` carrying both the
/// `existing` booking and the `attempted` request when the subject already
/// holds an overlapping one.
pub async fn create_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> AppResult<impl IntoResponse> {
    let request = booking_request(&auth, body)?;

    match state.engine.book(request).await? {
        BookOutcome::Booked { booking } => {
            tracing::info!(booking_id = booking.id, user_id = auth.user_id, "Booking created via API");
            Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
        }
        BookOutcome::Conflict { conflict } => Err(AppError::Booking(
            BookingError::DuplicateActiveBooking {
                existing: Box::new(conflict.existing),
                attempted: Box::new(conflict.attempted),
            },
        )),
    }
}

/// POST /api/v1/bookings/resolve-conflict
///
/// `keep_existing` returns the existing booking untouched; `replace_with_new`
/// cancels it and books the attempted request as one unit.
pub async fn resolve_conflict(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ResolveConflictBody>,
) -> AppResult<impl IntoResponse> {
    let attempted = booking_request(&auth, body.attempted)?;
    let booking = state
        .engine
        .resolve_conflict(body.existing_id, attempted, body.choice)
        .await?;

    tracing::info!(
        booking_id = booking.id,
        user_id = auth.user_id,
        choice = ?body.choice,
        "Conflict resolved via API",
    );

    Ok(Json(DataResponse { data: booking }))
}

// ---------------------------------------------------------------------------
// Lifecycle by id
// ---------------------------------------------------------------------------

/// GET /api/v1/bookings/{kind}/{id}
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(BookingKind, DbId)>,
) -> AppResult<impl IntoResponse> {
    let booking = owned_booking(&auth, &state, kind, id).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{kind}/{id}/cancel
pub async fn cancel_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(BookingKind, DbId)>,
    Json(body): Json<ReasonBody>,
) -> AppResult<impl IntoResponse> {
    owned_booking(&auth, &state, kind, id).await?;
    let booking = state
        .engine
        .cancel(&BookingHandle::Id(kind, id), body.reason)
        .await?;

    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{kind}/{id}/reschedule
pub async fn reschedule_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(BookingKind, DbId)>,
    Json(body): Json<RescheduleBody>,
) -> AppResult<impl IntoResponse> {
    owned_booking(&auth, &state, kind, id).await?;
    let booking = state
        .engine
        .reschedule(&BookingHandle::Id(kind, id), body.target, body.date)
        .await?;

    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{kind}/{id}/outcome
///
/// Staff record whether the person showed up.
pub async fn mark_outcome(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path((kind, id)): Path<(BookingKind, DbId)>,
    Json(body): Json<OutcomeBody>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .engine
        .mark_outcome(
            &BookingHandle::Id(kind, id),
            body.outcome,
            body.reason,
            body.metadata,
        )
        .await?;

    tracing::info!(booking_id = id, user_id = staff.user_id, outcome = ?body.outcome, "Outcome recorded");

    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/bookings/{kind}/{id}/expire
///
/// Driven by the expiry sweep.
pub async fn expire_booking(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path((kind, id)): Path<(BookingKind, DbId)>,
) -> AppResult<impl IntoResponse> {
    let booking = state.engine.expire(&BookingHandle::Id(kind, id)).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/volunteer-bookings/{id}/review
pub async fn review_volunteer_booking(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ReviewBody>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .engine
        .review(
            &BookingHandle::Id(BookingKind::Volunteer, id),
            body.decision,
            body.reason,
        )
        .await?;

    tracing::info!(booking_id = id, user_id = staff.user_id, decision = ?body.decision, "Volunteer booking reviewed");

    Ok(Json(DataResponse { data: booking }))
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// GET /api/v1/bookings/mine?from=
///
/// The caller's own bookings dated `from` (default today) or later.
pub async fn list_my_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<FromDateParams>,
) -> AppResult<impl IntoResponse> {
    let subject = auth
        .own_subject(BookingKind::Shopper)
        .or_else(|| auth.own_subject(BookingKind::Volunteer))
        .ok_or_else(|| {
            AppError::BadRequest(format!("role '{}' holds no bookings of its own", auth.role))
        })?;

    let bookings = state.engine.list_for_subject(subject, params.from).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/subjects/{subject_type}/{subject_id}/bookings?from=
pub async fn list_subject_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((subject_type, subject_id)): Path<(String, DbId)>,
    Query(params): Query<FromDateParams>,
) -> AppResult<impl IntoResponse> {
    let subject = parse_subject(&subject_type, subject_id)?;
    auth.ensure_may_act_for(subject)?;

    let bookings = state.engine.list_for_subject(subject, params.from).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// GET /api/v1/day-sheet?kind=&date=
///
/// Every booking of one ledger on one date, ordered by start time.
pub async fn day_sheet(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<DaySheetParams>,
) -> AppResult<impl IntoResponse> {
    let bookings = state
        .engine
        .list_for_date(params.kind, params.date)
        .await?;
    Ok(Json(DataResponse { data: bookings }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Turn a request body into an engine request on behalf of `auth`.
pub(crate) fn booking_request(
    auth: &AuthUser,
    body: CreateBookingBody,
) -> AppResult<BookingRequest> {
    let subject = match body.subject {
        Some(subject) => subject,
        None => auth.own_subject(body.target.kind()).ok_or_else(|| {
            AppError::BadRequest("subject is required when booking for someone else".into())
        })?,
    };
    auth.ensure_may_act_for(subject)?;

    Ok(BookingRequest {
        subject,
        target: body.target,
        date: body.date,
        note: body.note,
        booked_by: booked_by(auth),
    })
}

pub(crate) fn booked_by(auth: &AuthUser) -> BookedBy {
    if auth.is_staff() {
        BookedBy::Staff
    } else if auth.role == ROLE_AGENCY {
        BookedBy::Agency
    } else {
        BookedBy::SelfService
    }
}

/// Load a booking the caller is allowed to manage.
async fn owned_booking(
    auth: &AuthUser,
    state: &AppState,
    kind: BookingKind,
    id: DbId,
) -> AppResult<Booking> {
    let booking = state.engine.find(&BookingHandle::Id(kind, id)).await?;
    auth.ensure_may_act_for(booking.subject)?;
    Ok(booking)
}

fn parse_subject(subject_type: &str, id: DbId) -> AppResult<Subject> {
    match subject_type {
        "client" => Ok(Subject::Client(id)),
        "new_client" => Ok(Subject::NewClient(id)),
        "volunteer" => Ok(Subject::Volunteer(id)),
        other => Err(AppError::BadRequest(format!(
            "unknown subject type '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pantry_core::error::CoreError;
    use pantry_core::roles::{ROLE_CLIENT, ROLE_STAFF};

    fn user(id: DbId, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            role: role.to_string(),
        }
    }

    fn body(subject: Option<Subject>) -> CreateBookingBody {
        CreateBookingBody {
            subject,
            target: SlotRef::Shopper(1),
            date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            note: None,
        }
    }

    #[test]
    fn client_books_as_self_by_default() {
        let request = booking_request(&user(9, ROLE_CLIENT), body(None)).unwrap();
        assert_eq!(request.subject, Subject::Client(9));
        assert_eq!(request.booked_by, BookedBy::SelfService);
    }

    #[test]
    fn staff_must_name_the_subject() {
        assert_matches!(
            booking_request(&user(1, ROLE_STAFF), body(None)),
            Err(AppError::BadRequest(_))
        );
        let request =
            booking_request(&user(1, ROLE_STAFF), body(Some(Subject::Client(4)))).unwrap();
        assert_eq!(request.booked_by, BookedBy::Staff);
    }

    #[test]
    fn client_cannot_book_for_another_client() {
        let err = booking_request(&user(9, ROLE_CLIENT), body(Some(Subject::Client(10))));
        assert_matches!(err, Err(AppError::Core(CoreError::Forbidden(_))));
    }

    #[test]
    fn subject_path_types() {
        assert_eq!(parse_subject("new_client", 3).unwrap(), Subject::NewClient(3));
        assert!(parse_subject("agency", 3).is_err());
    }
}
