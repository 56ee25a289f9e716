use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog administration mounted at `/admin`. Staff only.
///
/// ```text
/// GET    /slots                      -> list_slots
/// POST   /slots                      -> create_slot
/// PUT    /slots/{id}                 -> update_slot
/// DELETE /slots/{id}                 -> delete_slot
/// GET    /roles                      -> list_roles
/// POST   /roles                      -> create_role
/// POST   /roles/{role_id}/shifts     -> create_shift
/// GET    /shifts                     -> list_shifts
/// PUT    /shifts/{id}                -> update_shift
/// GET    /overrides                  -> list_overrides
/// POST   /overrides                  -> create_override
/// DELETE /overrides/{table}/{id}     -> delete_override
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(catalog::list_slots).post(catalog::create_slot))
        .route(
            "/slots/{id}",
            put(catalog::update_slot).delete(catalog::delete_slot),
        )
        .route("/roles", get(catalog::list_roles).post(catalog::create_role))
        .route("/roles/{role_id}/shifts", post(catalog::create_shift))
        .route("/shifts", get(catalog::list_shifts))
        .route("/shifts/{id}", put(catalog::update_shift))
        .route(
            "/overrides",
            get(catalog::list_overrides).post(catalog::create_override),
        )
        .route("/overrides/{table}/{id}", delete(catalog::delete_override))
}
