//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// Upgrades a request on any path to a WebSocket relay session.
///
/// Messages and frames larger than the configured ceiling are rejected by
/// the transport before they reach the relay.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let context = Arc::clone(&state.context);
    let cancel = state.cancel.clone();

    ws.max_message_size(state.max_message_size)
        .max_frame_size(state.max_message_size)
        .on_upgrade(move |socket| run_connection(socket, context, cancel))
}
