use axum::routing::post;
use axum::Router;

use crate::handlers::series;
use crate::state::AppState;

/// Recurring series routes mounted at `/volunteer-series`.
///
/// ```text
/// POST /              -> create_series
/// POST /{id}/cancel   -> cancel_series
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(series::create_series))
        .route("/{id}/cancel", post(series::cancel_series))
}
