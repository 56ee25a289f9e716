//! Handlers for slot and shift availability.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::AvailabilityParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/availability/slots?date=&include_past=
///
/// Shopper slots with remaining seats and closure reasons. A past date
/// advances to the next open day unless `include_past` is set.
pub async fn shopper_slots(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<impl IntoResponse> {
    let day = state
        .engine
        .shopper_availability(params.date, params.include_past)
        .await?;

    Ok(Json(DataResponse { data: day }))
}

/// GET /api/v1/availability/shifts?date=&include_past=&role_id=
pub async fn volunteer_shifts(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> AppResult<impl IntoResponse> {
    let day = state
        .engine
        .volunteer_availability(params.date, params.include_past, params.role_id)
        .await?;

    Ok(Json(DataResponse { data: day }))
}
