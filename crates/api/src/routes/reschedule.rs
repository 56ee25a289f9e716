use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reschedule;
use crate::state::AppState;

/// Token routes mounted at `/reschedule`. No authentication: the token is
/// the credential.
///
/// ```text
/// GET  /{token}          -> get_by_token
/// POST /{token}          -> reschedule_by_token
/// POST /{token}/cancel   -> cancel_by_token
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{token}",
            get(reschedule::get_by_token).post(reschedule::reschedule_by_token),
        )
        .route("/{token}/cancel", post(reschedule::cancel_by_token))
}
