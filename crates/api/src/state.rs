use std::sync::Arc;

use pantry_scheduler::BookingEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly by the catalog admin handlers.
    pub pool: pantry_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Booking engine shared by every booking handler.
    pub engine: Arc<BookingEngine>,
    /// Bus the engine publishes booking events on.
    pub event_bus: Arc<pantry_events::EventBus>,
}
