//! WebSocket gateway: agent connections in, operator broadcasts out.

pub mod broadcast;
pub mod handler;
pub mod registry;
pub mod router;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let path = match state.config.server.ws_path.as_str() {
        p if p.starts_with('/') => p.to_string(),
        p => format!("/{p}"),
    };
    Router::new()
        .route(&path, axum::routing::get(handler::agent_ws_handler))
        .with_state(state)
}
