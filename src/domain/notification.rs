//! Broadcast channel carrying updates to the host UI.
//!
//! [`NotificationChannel`] wraps a [`tokio::sync::broadcast`] channel.
//! Every decoded image and every forwarded command publishes a
//! [`Notification`], and the host side subscribes to relay them to its UI.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Topic under which all transceiver notifications are published.
pub const TRANSCEIVER_MSG: &str = "TRANSCEIVER_MSG";

/// Notification body, serialized as a single-key JSON object.
///
/// ```json
/// {"pict_cha": "data:image/png;base64,..."}
/// {"comfyui_command": "enqueue_prompt"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPayload {
    /// A data URI of a newly received image.
    PictCha(String),
    /// A command to forward to the graph host.
    ComfyuiCommand(String),
}

impl NotificationPayload {
    /// Returns the payload key as a static string slice.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::PictCha(_) => "pict_cha",
            Self::ComfyuiCommand(_) => "comfyui_command",
        }
    }
}

/// One published notification.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Notification topic, normally [`TRANSCEIVER_MSG`].
    pub topic: String,
    /// Notification body.
    pub payload: NotificationPayload,
    /// Publication timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Broadcast bus for [`Notification`]s.
///
/// Image notifications can be large, so subscribers share one allocation
/// through an [`Arc`]. When the ring buffer is full, the oldest
/// notifications are dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct NotificationChannel {
    sender: broadcast::Sender<Arc<Notification>>,
}

impl NotificationChannel {
    /// Creates a new channel with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a notification to all subscribers. Fire-and-forget.
    ///
    /// Returns the number of receivers that received it. With no active
    /// receivers the notification is silently dropped.
    pub fn publish(&self, topic: &str, payload: NotificationPayload) -> usize {
        let notification = Notification {
            topic: topic.to_string(),
            payload,
            timestamp: Utc::now(),
        };
        self.sender.send(Arc::new(notification)).unwrap_or(0)
    }

    /// Creates a new receiver for all future notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
