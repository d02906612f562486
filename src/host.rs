//! Narrow interface for the graph host.
//!
//! The host reads the current image once per graph execution and starts the
//! listener as a side effect of describing its inputs. It calls in from its
//! own threads, so every lifecycle call here is a bounded blocking call.

use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::broadcast;

use crate::app_state::TransceiverContext;
use crate::domain::Notification;
use crate::error::TransceiverError;
use crate::lifecycle::{ServerOperation, ServerStatus};

/// Host-side view of a launched transceiver.
#[derive(Debug, Clone)]
pub struct HostBridge {
    context: Arc<TransceiverContext>,
}

impl HostBridge {
    /// Wraps a shared context.
    #[must_use]
    pub const fn new(context: Arc<TransceiverContext>) -> Self {
        Self { context }
    }

    /// Starts the listener if it is not running. Idempotent.
    ///
    /// Must be called from a thread outside the async runtime.
    ///
    /// # Errors
    ///
    /// See [`crate::lifecycle::LifecycleHandle::blocking_call`].
    pub fn ensure_started(&self) -> Result<ServerStatus, TransceiverError> {
        tracing::info!("host requested listener start");
        self.context.lifecycle.blocking_call(ServerOperation::Start)
    }

    /// Returns the current image; the 1×1 placeholder if none arrived yet.
    #[must_use]
    pub fn current_image(&self) -> Arc<DynamicImage> {
        self.context.current_image.snapshot()
    }

    /// Change-detection token for the current image.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.context.current_image.fingerprint()
    }

    /// Subscribes to notifications destined for the host UI.
    #[must_use]
    pub fn notifications(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.context.notifications.subscribe()
    }
}
