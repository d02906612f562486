//! Domain layer: frames, commands, and shared transceiver state.
//!
//! This module contains the pure message model (frame classification,
//! command parsing, data-URI formats) together with the shared cells the
//! relay writes to: the current image, the listener configuration, and
//! the notification channel.

pub mod command;
pub mod current_image;
pub mod frame;
pub mod notification;
pub mod payload_format;
pub mod server_config;

pub use command::{Command, CommandTag};
pub use current_image::CurrentImage;
pub use frame::Frame;
pub use notification::{Notification, NotificationChannel, NotificationPayload, TRANSCEIVER_MSG};
pub use payload_format::PayloadFormat;
pub use server_config::{ServerConfig, SharedServerConfig};
