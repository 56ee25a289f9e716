use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Booking routes, merged at the `/api/v1` root.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/resolve-conflict", post(bookings::resolve_conflict))
        .route("/bookings/mine", get(bookings::list_my_bookings))
        .route("/bookings/{kind}/{id}", get(bookings::get_booking))
        .route("/bookings/{kind}/{id}/cancel", post(bookings::cancel_booking))
        .route(
            "/bookings/{kind}/{id}/reschedule",
            post(bookings::reschedule_booking),
        )
        .route("/bookings/{kind}/{id}/outcome", post(bookings::mark_outcome))
        .route("/bookings/{kind}/{id}/expire", post(bookings::expire_booking))
        .route(
            "/volunteer-bookings/{id}/review",
            post(bookings::review_volunteer_booking),
        )
        .route(
            "/subjects/{subject_type}/{id}/bookings",
            get(bookings::list_subject_bookings),
        )
        .route("/day-sheet", get(bookings::day_sheet))
}
