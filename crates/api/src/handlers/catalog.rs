//! Staff administration of slots, volunteer roles/shifts and availability
//! overrides.
//!
//! Every successful write drops the engine's cached catalog so the next
//! availability read or claim sees it. Capacity edits never touch existing
//! bookings.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveTime;
use pantry_core::catalog::AvailabilityOverride;
use pantry_core::error::CoreError;
use pantry_core::types::DbId;
use pantry_db::models::availability_override::{
    BlockedSlotRow, BreakRow, HolidayRow, RecurringBlockedSlotRow,
};
use pantry_db::models::slot::{CreateSlot, UpdateSlot};
use pantry_db::models::volunteer_role::{
    CreateVolunteerRole, CreateVolunteerShift, UpdateVolunteerShift,
};
use pantry_db::repositories::{AvailabilityOverrideRepo, SlotRepo, VolunteerRoleRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireStaff;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/slots
pub async fn list_slots(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let slots = SlotRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: slots }))
}

/// POST /api/v1/admin/slots
pub async fn create_slot(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateSlot>,
) -> AppResult<impl IntoResponse> {
    validate_window(input.start_time, input.end_time)?;
    validate_capacity(input.max_capacity)?;

    let slot = SlotRepo::create(&state.pool, &input).await?;
    state.engine.invalidate_catalog();

    tracing::info!(slot_id = slot.id, user_id = staff.user_id, "Slot created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: slot })))
}

/// PUT /api/v1/admin/slots/{id}
pub async fn update_slot(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
    Json(input): Json<UpdateSlot>,
) -> AppResult<impl IntoResponse> {
    if let Some(capacity) = input.max_capacity {
        validate_capacity(capacity)?;
    }
    if let (Some(start), Some(end)) = (input.start_time, input.end_time) {
        validate_window(start, end)?;
    }

    let slot = SlotRepo::update(&state.pool, slot_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Slot",
            id: slot_id,
        }))?;
    state.engine.invalidate_catalog();

    tracing::info!(slot_id, user_id = staff.user_id, capacity = slot.max_capacity, "Slot updated");
    Ok(Json(DataResponse { data: slot }))
}

/// DELETE /api/v1/admin/slots/{id}
///
/// Rejected with 409 while reservations still reference the slot.
pub async fn delete_slot(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(slot_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !SlotRepo::delete(&state.pool, slot_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Slot",
            id: slot_id,
        }));
    }
    state.engine.invalidate_catalog();

    tracing::info!(slot_id, user_id = staff.user_id, "Slot deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Volunteer roles and shifts
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/roles
pub async fn list_roles(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let roles = VolunteerRoleRepo::list_roles(&state.pool).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// POST /api/v1/admin/roles
pub async fn create_role(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(input): Json<CreateVolunteerRole>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("role name must not be empty".into()));
    }

    let role = VolunteerRoleRepo::create_role(&state.pool, &input).await?;
    state.engine.invalidate_catalog();

    tracing::info!(role_id = role.id, user_id = staff.user_id, "Volunteer role created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: role })))
}

/// GET /api/v1/admin/shifts?include_inactive=
pub async fn list_shifts(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let shifts = VolunteerRoleRepo::list_shifts(&state.pool, !params.include_inactive).await?;
    Ok(Json(DataResponse { data: shifts }))
}

/// POST /api/v1/admin/roles/{role_id}/shifts
pub async fn create_shift(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(role_id): Path<DbId>,
    Json(input): Json<CreateVolunteerShift>,
) -> AppResult<impl IntoResponse> {
    validate_window(input.start_time, input.end_time)?;
    validate_capacity(input.max_volunteers)?;

    let shift = VolunteerRoleRepo::create_shift(&state.pool, role_id, &input).await?;
    state.engine.invalidate_catalog();

    tracing::info!(shift_id = shift.shift_id, role_id, user_id = staff.user_id, "Volunteer shift created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: shift })))
}

/// PUT /api/v1/admin/shifts/{id}
pub async fn update_shift(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(shift_id): Path<DbId>,
    Json(input): Json<UpdateVolunteerShift>,
) -> AppResult<impl IntoResponse> {
    if let Some(max) = input.max_volunteers {
        validate_capacity(max)?;
    }
    if let (Some(start), Some(end)) = (input.start_time, input.end_time) {
        validate_window(start, end)?;
    }

    let shift = VolunteerRoleRepo::update_shift(&state.pool, shift_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VolunteerRoleShift",
            id: shift_id,
        }))?;
    state.engine.invalidate_catalog();

    tracing::info!(shift_id, user_id = staff.user_id, "Volunteer shift updated");
    Ok(Json(DataResponse { data: shift }))
}

// ---------------------------------------------------------------------------
// Availability overrides
// ---------------------------------------------------------------------------

/// Every override row, grouped by table, with ids for deletion.
#[derive(Debug, Serialize)]
pub struct OverrideListing {
    pub holidays: Vec<HolidayRow>,
    pub blocked_slots: Vec<BlockedSlotRow>,
    pub recurring_blocked_slots: Vec<RecurringBlockedSlotRow>,
    pub breaks: Vec<BreakRow>,
}

#[derive(Debug, Serialize)]
pub struct CreatedOverride {
    pub id: DbId,
    #[serde(flatten)]
    pub rule: AvailabilityOverride,
}

/// GET /api/v1/admin/overrides
pub async fn list_overrides(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let listing = OverrideListing {
        holidays: AvailabilityOverrideRepo::list_holidays(&state.pool).await?,
        blocked_slots: AvailabilityOverrideRepo::list_blocked_slots(&state.pool).await?,
        recurring_blocked_slots: AvailabilityOverrideRepo::list_recurring_blocked_slots(
            &state.pool,
        )
        .await?,
        breaks: AvailabilityOverrideRepo::list_breaks(&state.pool).await?,
    };
    Ok(Json(DataResponse { data: listing }))
}

/// POST /api/v1/admin/overrides
///
/// Body is a tagged override, e.g.
/// `{ "type": "holiday", "date": "2024-12-25", "reason": "Christmas" }`.
/// Existing bookings on the affected dates are left in place.
pub async fn create_override(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Json(rule): Json<AvailabilityOverride>,
) -> AppResult<impl IntoResponse> {
    validate_override(&rule)?;

    let id = AvailabilityOverrideRepo::create(&state.pool, &rule).await?;
    state.engine.invalidate_catalog();

    tracing::info!(override_id = id, user_id = staff.user_id, rule = ?rule, "Availability override created");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedOverride { id, rule },
        }),
    ))
}

/// DELETE /api/v1/admin/overrides/{table}/{id}
///
/// `table` is one of `holidays`, `blocked_slots`, `recurring_blocked_slots`
/// or `breaks`.
pub async fn delete_override(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path((table, id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    if !AvailabilityOverrideRepo::delete(&state.pool, &table, id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "AvailabilityOverride",
            id,
        }));
    }
    state.engine.invalidate_catalog();

    tracing::info!(override_id = id, table = %table, user_id = staff.user_id, "Availability override deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_window(start: NaiveTime, end: NaiveTime) -> AppResult<()> {
    if start >= end {
        return Err(AppError::BadRequest(format!(
            "start_time {start} must be before end_time {end}"
        )));
    }
    Ok(())
}

fn validate_capacity(capacity: i32) -> AppResult<()> {
    if capacity < 0 {
        return Err(AppError::BadRequest("capacity must not be negative".into()));
    }
    Ok(())
}

fn validate_override(rule: &AvailabilityOverride) -> AppResult<()> {
    let (day_of_week, week_of_month) = match rule {
        AvailabilityOverride::Holiday { .. } | AvailabilityOverride::BlockedSlot { .. } => {
            return Ok(())
        }
        AvailabilityOverride::RecurringBlockedSlot {
            day_of_week,
            week_of_month,
            ..
        } => (*day_of_week, Some(*week_of_month)),
        AvailabilityOverride::Break { day_of_week, .. } => (*day_of_week, None),
    };

    if day_of_week > 6 {
        return Err(AppError::BadRequest(
            "day_of_week must be 0 (Sunday) to 6 (Saturday)".into(),
        ));
    }
    if let Some(week) = week_of_month {
        if !(1..=5).contains(&week) {
            return Err(AppError::BadRequest("week_of_month must be 1 to 5".into()));
        }
    }
    Ok(())
}
