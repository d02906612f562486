//! # image-transceiver
//!
//! WebSocket relay between an image editor and a compute-graph host.
//!
//! The editor connects to a long-lived listener and sends two kinds of text
//! frames: JSON control commands and raw base64 images. Commands either
//! reconfigure the listener or are forwarded to the host; images are
//! published to the host UI as data URIs and decoded into the shared
//! current image. Every frame is acknowledged, and a bad frame never closes
//! the connection.
//!
//! ## Architecture
//!
//! ```text
//! Editor (WebSocket client)
//!     │
//!     ├── Connection loop (ws/)
//!     │     └── Frame classifier (domain/)
//!     │
//!     ├── Control protocol ─┬─▶ ServerConfig ──▶ restart request
//!     │      (service/)     └─▶ NotificationChannel ("comfyui_command")
//!     │
//!     ├── Image ingestion ──┬─▶ NotificationChannel ("pict_cha")
//!     │      (service/)     └─▶ CurrentImage
//!     │
//!     └── Lifecycle supervisor (lifecycle/)
//!           ▲ control channel
//!           └── LifecycleHandle ◀── host threads (host/)
//! ```

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod service;
pub mod ws;
