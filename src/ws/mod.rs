//! WebSocket layer: connection handling, command dispatch, attachments.
//!
//! The single endpoint at `/ws` carries the whole control protocol:
//! plain-text commands in, JSON event frames out.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// Builds the WebSocket router (the supervisor's only route).
pub fn build_router() -> Router<AppState> {
    Router::new().route("/ws", get(handler::ws_handler))
}
