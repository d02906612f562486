//! WebSocket connection state machine.
//!
//! ```text
//! AwaitingFrame ─▶ Classifying ─▶ Dispatching ─▶ Acknowledging ─┐
//!       ▲                                                         │
//!       └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Dispatch failures are logged and the frame is still acknowledged. The
//! loop only ends when the client closes, the transport fails, or the
//! listener is cancelled.

use std::sync::Arc;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::app_state::TransceiverContext;
use crate::domain::TRANSCEIVER_MSG;
use crate::error::TransceiverError;
use crate::service::{self, Dispatched};

/// Fixed text reply sent after every processed frame.
pub const ACKNOWLEDGEMENT: &str = "Sent a TRANSCEIVER_MSG json string to ComfyServer.";

/// Why a connection loop ended.
#[derive(Debug)]
enum Termination {
    ClientClosed,
    Cancelled,
    Transport(TransceiverError),
}

/// Runs the receive → dispatch → acknowledge loop for one connection.
pub async fn run_connection(
    socket: WebSocket,
    context: Arc<TransceiverContext>,
    cancel: CancellationToken,
) {
    let connection_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("connection", %connection_id);

    async move {
        tracing::info!("client connected");
        match relay(socket, &context, &cancel).await {
            Termination::ClientClosed => tracing::info!("client disconnected"),
            Termination::Cancelled => tracing::info!("connection cancelled by listener shutdown"),
            Termination::Transport(err) => {
                tracing::warn!(error = %err, kind = ?err.kind(), "connection ended by transport error");
            }
        }
    }
    .instrument(span)
    .await;
}

async fn relay(
    socket: WebSocket,
    context: &TransceiverContext,
    cancel: &CancellationToken,
) -> Termination {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        // AwaitingFrame
        let msg = tokio::select! {
            () = cancel.cancelled() => return Termination::Cancelled,
            msg = ws_rx.next() => msg,
        };

        let frame = match msg {
            Some(Ok(Message::Text(text))) => Ok(text),
            Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes.to_vec())
                .map(Utf8Bytes::from)
                .map_err(|err| TransceiverError::NonUtf8Frame(err.utf8_error())),
            Some(Ok(Message::Close(_))) | None => return Termination::ClientClosed,
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Termination::Transport(err.into()),
        };

        // Classifying + Dispatching
        let outcome = match frame {
            Ok(frame) => tokio::select! {
                () = cancel.cancelled() => return Termination::Cancelled,
                outcome = service::dispatch(frame.as_str(), context) => outcome,
            },
            Err(err) => Err(err),
        };
        log_outcome(&outcome);

        // Acknowledging
        tracing::info!(topic = TRANSCEIVER_MSG, "acknowledging frame");
        let sent = tokio::select! {
            () = cancel.cancelled() => return Termination::Cancelled,
            sent = ws_tx.send(Message::Text(Utf8Bytes::from_static(ACKNOWLEDGEMENT))) => sent,
        };
        if let Err(err) = sent {
            return Termination::Transport(err.into());
        }
    }
}

fn log_outcome(outcome: &Result<Dispatched, TransceiverError>) {
    match outcome {
        Ok(Dispatched::Command(result)) => tracing::debug!(?result, "command handled"),
        Ok(Dispatched::Image(image)) => {
            tracing::debug!(width = image.width, height = image.height, "image handled");
        }
        Err(err) => tracing::warn!(error = %err, kind = ?err.kind(), "frame dropped"),
    }
}
