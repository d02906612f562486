//! Front end of the lifecycle control channel.
//!
//! [`LifecycleHandle`] turns `start`/`stop`/`restart`/`report` calls into
//! [`ControlRequest`]s on an unbounded channel that only the supervisor
//! task consumes. Sending never blocks, so the handle is safe to use from
//! the relay's own connection tasks, from other async tasks, and from
//! foreign threads. Waiting for the answer is always bounded.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::error::TransceiverError;

/// Operations accepted by the lifecycle supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerOperation {
    /// Bind and run the listener unless one is already running.
    Start,
    /// Cancel the running listener, if any.
    Stop,
    /// Stop, settle, start.
    Restart,
    /// Report status without changing anything.
    Report,
    /// Stop the listener and end the supervisor loop.
    Shutdown,
}

impl fmt::Display for ServerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Report => "report",
            Self::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// Snapshot of the listener state returned by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerStatus {
    /// Whether a listener is currently running.
    pub running: bool,
    /// Configured listener port.
    pub port: u16,
    /// Address the running listener is bound to.
    pub local_addr: Option<SocketAddr>,
}

/// One message on the control channel.
#[derive(Debug)]
pub struct ControlRequest {
    /// Requested operation.
    pub operation: ServerOperation,
    /// Where to send the resulting status, if the caller waits for it.
    pub reply: Option<oneshot::Sender<ServerStatus>>,
}

/// Cloneable sender side of the lifecycle control channel.
#[derive(Debug, Clone)]
pub struct LifecycleHandle {
    sender: mpsc::UnboundedSender<ControlRequest>,
    runtime: Handle,
    timeout: Duration,
}

impl LifecycleHandle {
    /// Creates a handle and the receiver the supervisor consumes.
    ///
    /// `runtime` is the runtime the supervisor runs on; blocking calls from
    /// foreign threads are scheduled onto it. `timeout` bounds every wait.
    #[must_use]
    pub fn channel(
        runtime: Handle,
        timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ControlRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            sender,
            runtime,
            timeout,
        };
        (handle, receiver)
    }

    /// Returns `true` once the supervisor has dropped its receiver.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Enqueues an operation without waiting for it to run.
    ///
    /// # Errors
    ///
    /// Returns [`TransceiverError::ControlChannelClosed`] if the supervisor
    /// has shut down.
    pub fn submit(&self, operation: ServerOperation) -> Result<(), TransceiverError> {
        self.sender
            .send(ControlRequest {
                operation,
                reply: None,
            })
            .map_err(|_| TransceiverError::ControlChannelClosed)
    }

    /// Enqueues an operation and waits, bounded, for the resulting status.
    ///
    /// # Errors
    ///
    /// Returns [`TransceiverError::ControlChannelClosed`] if the supervisor
    /// is gone and [`TransceiverError::ControlTimeout`] if it did not answer
    /// in time.
    pub async fn call(&self, operation: ServerOperation) -> Result<ServerStatus, TransceiverError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ControlRequest {
                operation,
                reply: Some(reply),
            })
            .map_err(|_| TransceiverError::ControlChannelClosed)?;

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(_)) => Err(TransceiverError::ControlChannelClosed),
            Err(_) => Err(TransceiverError::ControlTimeout),
        }
    }

    /// Same as [`LifecycleHandle::call`], for threads outside the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TransceiverError::BlockingInRuntime`] when invoked from
    /// inside an async context, otherwise the errors of
    /// [`LifecycleHandle::call`].
    pub fn blocking_call(&self, operation: ServerOperation) -> Result<ServerStatus, TransceiverError> {
        if Handle::try_current().is_ok() {
            return Err(TransceiverError::BlockingInRuntime);
        }
        self.runtime.block_on(self.call(operation))
    }

    /// Starts the listener. Idempotent.
    ///
    /// # Errors
    ///
    /// See [`LifecycleHandle::call`].
    pub async fn start(&self) -> Result<ServerStatus, TransceiverError> {
        self.call(ServerOperation::Start).await
    }

    /// Stops the listener. No-op when stopped.
    ///
    /// # Errors
    ///
    /// See [`LifecycleHandle::call`].
    pub async fn stop(&self) -> Result<ServerStatus, TransceiverError> {
        self.call(ServerOperation::Stop).await
    }

    /// Stops, waits for the settle delay, and starts the listener.
    ///
    /// # Errors
    ///
    /// See [`LifecycleHandle::call`].
    pub async fn restart(&self) -> Result<ServerStatus, TransceiverError> {
        self.call(ServerOperation::Restart).await
    }

    /// Reports the listener status.
    ///
    /// # Errors
    ///
    /// See [`LifecycleHandle::call`].
    pub async fn report(&self) -> Result<ServerStatus, TransceiverError> {
        self.call(ServerOperation::Report).await
    }

    /// Stops the listener and ends the supervisor.
    ///
    /// # Errors
    ///
    /// See [`LifecycleHandle::call`].
    pub async fn shutdown(&self) -> Result<ServerStatus, TransceiverError> {
        self.call(ServerOperation::Shutdown).await
    }
}
