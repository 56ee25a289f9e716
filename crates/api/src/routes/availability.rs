use axum::routing::get;
use axum::Router;

use crate::handlers::availability;
use crate::state::AppState;

/// Availability routes mounted at `/availability`.
///
/// ```text
/// GET /slots     -> shopper_slots
/// GET /shifts    -> volunteer_shifts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(availability::shopper_slots))
        .route("/shifts", get(availability::volunteer_shifts))
}
