//! Server lifecycle: start, stop, restart, and report the listener.
//!
//! Lifecycle operations are messages on a single control channel consumed
//! by the [`Supervisor`] task. [`LifecycleHandle`] is the cloneable sender
//! used by everything else, including threads outside the runtime.

pub mod handle;
pub mod supervisor;

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub use handle::{ControlRequest, LifecycleHandle, ServerOperation, ServerStatus};
pub use supervisor::{StopReason, Supervisor};

use crate::app_state::TransceiverContext;
use crate::config::TransceiverConfig;

/// A launched supervisor together with the state it owns.
#[derive(Debug)]
pub struct Transceiver {
    /// Sender side of the control channel.
    pub lifecycle: LifecycleHandle,
    /// Shared transceiver state.
    pub context: Arc<TransceiverContext>,
    /// The supervisor task; completes after `Shutdown`.
    pub task: JoinHandle<()>,
}

/// Builds the shared context and spawns a stopped supervisor on `runtime`.
///
/// Can be called from any thread; the listener itself is only started by a
/// later `start` request.
pub fn launch(config: TransceiverConfig, runtime: &Handle) -> Transceiver {
    let (lifecycle, requests) = LifecycleHandle::channel(runtime.clone(), config.control_timeout);
    let context = Arc::new(TransceiverContext::new(&config, lifecycle.clone()));
    let supervisor = Supervisor::new(Arc::clone(&context), config, requests);
    let task = runtime.spawn(supervisor.run());

    Transceiver {
        lifecycle,
        context,
        task,
    }
}
