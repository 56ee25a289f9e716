//! Handlers for recurring volunteer series.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use pantry_core::booking::{BookingKind, Subject};
use pantry_core::recurrence::RecurrenceRule;
use pantry_core::types::DbId;
use serde::Deserialize;

use super::bookings::{booked_by, ReasonBody};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /volunteer-series`.
#[derive(Debug, Deserialize)]
pub struct CreateSeriesBody {
    /// Defaults to the calling volunteer; staff must supply it.
    pub volunteer_id: Option<DbId>,
    pub shift_id: DbId,
    pub start_date: NaiveDate,
    pub rule: RecurrenceRule,
}

/// POST /api/v1/volunteer-series
///
/// 201 with the series, the bookings made and the dates skipped (with the
/// reason each was skipped).
pub async fn create_series(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateSeriesBody>,
) -> AppResult<impl IntoResponse> {
    let subject = match body.volunteer_id {
        Some(id) => Subject::Volunteer(id),
        None => auth.own_subject(BookingKind::Volunteer).ok_or_else(|| {
            AppError::BadRequest("volunteer_id is required when booking for someone else".into())
        })?,
    };
    auth.ensure_may_act_for(subject)?;

    let outcome = state
        .engine
        .create_recurring(
            subject.id(),
            body.shift_id,
            body.start_date,
            body.rule,
            booked_by(&auth),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// POST /api/v1/volunteer-series/{id}/cancel
///
/// Cancels members dated today or later; past members are untouched.
pub async fn cancel_series(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(series_id): Path<DbId>,
    Json(body): Json<ReasonBody>,
) -> AppResult<impl IntoResponse> {
    let series = state.engine.series(series_id).await?;
    auth.ensure_may_act_for(Subject::Volunteer(series.volunteer_id))?;

    let cancelled = state.engine.cancel_series(series_id, body.reason).await?;

    tracing::info!(
        series_id,
        user_id = auth.user_id,
        cancelled = cancelled.cancelled.len(),
        "Series cancelled via API",
    );

    Ok(Json(DataResponse { data: cancelled }))
}
