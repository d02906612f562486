//! Shared transceiver state.
//!
//! [`TransceiverContext`] is created once per process by
//! [`crate::lifecycle::launch`] and owned by the lifecycle supervisor. The
//! connection handler and both message pipelines receive it by reference.
//! [`AppState`] is what each running listener injects into its Axum router.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::TransceiverConfig;
use crate::domain::{CurrentImage, NotificationChannel, SharedServerConfig};
use crate::lifecycle::LifecycleHandle;

/// State shared by the supervisor, the relay pipelines, and the host.
#[derive(Debug)]
pub struct TransceiverContext {
    /// Listener configuration, rewritten by `config` commands.
    pub server_config: SharedServerConfig,
    /// Last successfully decoded image.
    pub current_image: CurrentImage,
    /// Outbound notifications to the host UI.
    pub notifications: NotificationChannel,
    /// Front end of the lifecycle control channel.
    pub lifecycle: LifecycleHandle,
}

impl TransceiverContext {
    /// Builds the context from configuration and a lifecycle handle.
    #[must_use]
    pub fn new(config: &TransceiverConfig, lifecycle: LifecycleHandle) -> Self {
        Self {
            server_config: SharedServerConfig::new(config.server_config()),
            current_image: CurrentImage::new(),
            notifications: NotificationChannel::new(config.notification_capacity),
            lifecycle,
        }
    }
}

/// Per-listener state available to the WebSocket handler via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Shared transceiver context.
    pub context: Arc<TransceiverContext>,
    /// Cancelled when this listener is stopped.
    pub cancel: CancellationToken,
    /// Largest inbound message accepted, in bytes.
    pub max_message_size: usize,
}
