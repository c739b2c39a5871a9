//! Axum Router Configuration
//!
//! The relay exposes a single WebSocket acceptance endpoint; everything else
//! about the session happens inside `ws::session`.

use crate::{state::AppState, ws::ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Creates the main Axum router for the relay.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
