//! Lifecycle supervisor: the only owner of the running listener.
//!
//! The supervisor runs as one task on the event loop and consumes
//! [`ControlRequest`]s in order. Because nothing else touches the listener
//! handle, start/stop/restart never race each other.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::handle::{ControlRequest, ServerOperation, ServerStatus};
use crate::app_state::{AppState, TransceiverContext};
use crate::config::TransceiverConfig;
use crate::error::{TransceiverError, bind_addr};
use crate::ws::handler::ws_handler;

/// Why a listener is being cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Explicit `stop` request.
    Stopped,
    /// First half of a restart.
    Restarting,
    /// Supervisor shutdown.
    Shutdown,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Stopped => "stopped",
            Self::Restarting => "restarting",
            Self::Shutdown => "shutdown",
        };
        f.write_str(reason)
    }
}

/// The running listener task.
#[derive(Debug)]
struct ListenerHandle {
    task: JoinHandle<()>,
    cancel: CancellationToken,
    local_addr: SocketAddr,
}

/// Owns the listener and applies lifecycle operations one at a time.
#[derive(Debug)]
pub struct Supervisor {
    context: Arc<TransceiverContext>,
    config: TransceiverConfig,
    requests: mpsc::UnboundedReceiver<ControlRequest>,
    listener: Option<ListenerHandle>,
}

impl Supervisor {
    /// Creates a stopped supervisor.
    #[must_use]
    pub fn new(
        context: Arc<TransceiverContext>,
        config: TransceiverConfig,
        requests: mpsc::UnboundedReceiver<ControlRequest>,
    ) -> Self {
        Self {
            context,
            config,
            requests,
            listener: None,
        }
    }

    /// Consumes control requests until `Shutdown` arrives or every sender
    /// is dropped.
    pub async fn run(mut self) {
        tracing::debug!("lifecycle supervisor running");
        while let Some(request) = self.requests.recv().await {
            let operation = request.operation;
            let status = self.apply(operation).await;
            if let Some(reply) = request.reply {
                let _ = reply.send(status);
            }
            if operation == ServerOperation::Shutdown {
                break;
            }
        }
        self.stop(StopReason::Shutdown).await;
        tracing::debug!("lifecycle supervisor finished");
    }

    /// Applies one operation and returns the resulting status.
    pub async fn apply(&mut self, operation: ServerOperation) -> ServerStatus {
        tracing::info!(%operation, "server control");
        match operation {
            ServerOperation::Start => self.start().await,
            ServerOperation::Stop => self.stop(StopReason::Stopped).await,
            ServerOperation::Restart => self.restart().await,
            ServerOperation::Report => {}
            ServerOperation::Shutdown => self.stop(StopReason::Shutdown).await,
        }
        self.report().await
    }

    /// Returns the current status without changing anything observable.
    pub async fn report(&mut self) -> ServerStatus {
        self.reap_finished();
        ServerStatus {
            running: self.listener.is_some(),
            port: self.context.server_config.port().await,
            local_addr: self.listener.as_ref().map(|listener| listener.local_addr),
        }
    }

    async fn start(&mut self) {
        self.reap_finished();
        if let Some(listener) = &self.listener {
            tracing::warn!(addr = %listener.local_addr, "transceiver server is already running");
            return;
        }

        let port = self.context.server_config.port().await;
        let listener = match self.bind(port).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!(error = %err, kind = ?err.kind(), "listener failed to start");
                return;
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::error!(error = %err, "bound listener has no local address");
                return;
            }
        };

        let cancel = CancellationToken::new();
        let state = AppState {
            context: Arc::clone(&self.context),
            cancel: cancel.clone(),
            max_message_size: self.config.max_message_size,
        };
        let task = tokio::spawn(serve(listener, state));

        tracing::info!(addr = %local_addr, "server listening");
        self.listener = Some(ListenerHandle {
            task,
            cancel,
            local_addr,
        });
    }

    async fn stop(&mut self, reason: StopReason) {
        let Some(mut listener) = self.listener.take() else {
            tracing::debug!(%reason, "no listener to stop");
            return;
        };

        tracing::info!(%reason, addr = %listener.local_addr, "stopping listener");
        listener.cancel.cancel();
        if tokio::time::timeout(self.config.stop_timeout, &mut listener.task)
            .await
            .is_err()
        {
            tracing::warn!(%reason, "listener did not unwind in time; aborting");
            listener.task.abort();
        }
    }

    async fn restart(&mut self) {
        self.stop(StopReason::Restarting).await;
        tokio::time::sleep(self.config.restart_settle).await;
        self.start().await;
    }

    /// Binds within the configured bound so that callers see a ready
    /// listener as soon as `start` returns.
    async fn bind(&self, port: u16) -> Result<TcpListener, TransceiverError> {
        let host = self.config.host.as_str();
        let addr = bind_addr(host, port);
        match tokio::time::timeout(self.config.bind_timeout, TcpListener::bind((host, port))).await
        {
            Ok(Ok(listener)) => Ok(listener),
            Ok(Err(source)) => Err(TransceiverError::Bind { addr, source }),
            Err(_) => Err(TransceiverError::BindTimeout(addr)),
        }
    }

    /// Forgets a listener whose task already ended on its own.
    fn reap_finished(&mut self) {
        if let Some(listener) = &self.listener
            && listener.task.is_finished()
        {
            tracing::warn!(addr = %listener.local_addr, "listener exited unexpectedly");
            self.listener = None;
        }
    }
}

/// Serves WebSocket upgrades on every path until the listener is cancelled.
async fn serve(listener: TcpListener, state: AppState) {
    let shutdown = state.cancel.clone().cancelled_owned();
    let app = Router::new()
        .fallback(ws_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %err, "listener failed");
    }
    tracing::info!("listener closed");
}
