use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// What the booking engine currently sees of the slot catalog.
#[derive(Serialize)]
pub struct CatalogHealth {
    pub slots: usize,
    pub shifts: usize,
    pub overrides: usize,
    /// Staff edits since startup; each one drops the cached catalog.
    pub generation: u64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` only when both the database and the catalog are usable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// `None` when the catalog could not be loaded; bookings would fail.
    pub catalog: Option<CatalogHealth>,
}

/// GET /health -- database reachability and the catalog bookings run on.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = pantry_db::health_check(&state.pool).await.is_ok();

    let catalog = match state.engine.catalog().await {
        Ok(catalog) => Some(CatalogHealth {
            slots: catalog.slots.len(),
            shifts: catalog.shifts.len(),
            overrides: catalog.overrides.len(),
            generation: state.engine.catalog_generation(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not load catalog");
            None
        }
    };

    let status = if db_healthy && catalog.is_some() {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        catalog,
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
