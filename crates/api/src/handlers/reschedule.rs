//! Reschedule-token endpoints.
//!
//! The token mailed with every booking is a bearer capability: whoever holds
//! it may view, move or cancel that one booking without signing in.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use pantry_core::booking::BookingHandle;

use super::bookings::{ReasonBody, RescheduleBody};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/reschedule/{token}
pub async fn get_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let booking = state.engine.find(&BookingHandle::Token(token)).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/reschedule/{token}
///
/// Move the booking; the token stays valid for the moved booking.
pub async fn reschedule_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .engine
        .reschedule(&BookingHandle::Token(token), body.target, body.date)
        .await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/reschedule/{token}/cancel
pub async fn cancel_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ReasonBody>,
) -> AppResult<impl IntoResponse> {
    let booking = state
        .engine
        .cancel(&BookingHandle::Token(token), body.reason)
        .await?;
    Ok(Json(DataResponse { data: booking }))
}
