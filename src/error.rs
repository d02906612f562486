//! Transceiver error types with failure-category mapping.
//!
//! [`TransceiverError`] is the central error type. Each variant maps to one
//! [`ErrorKind`], which decides how far the failure is allowed to travel:
//! protocol and decode errors stay inside one message, transport errors end
//! one connection, bind errors keep the listener stopped.

use std::net::SocketAddr;

/// Failure category of a [`TransceiverError`].
///
/// | Kind        | Scope                                   |
/// |-------------|-----------------------------------------|
/// | `Transport` | ends the current connection             |
/// | `Protocol`  | drops one structured frame              |
/// | `Decode`    | drops one undecodable frame             |
/// | `Bind`      | listener stays stopped                  |
/// | `Control`   | lifecycle request was not completed     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Socket-level receive or send failure.
    Transport,
    /// Malformed or unsupported structured command.
    Protocol,
    /// Frame text, base64, or image decode failure.
    Decode,
    /// Listener could not bind its address.
    Bind,
    /// Lifecycle control channel failure.
    Control,
}

/// Server-side error enum.
#[derive(Debug, thiserror::Error)]
pub enum TransceiverError {
    /// WebSocket receive or send failed.
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    /// Structured frame lacks a usable `command` field or carries ill-typed arguments.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// The `command` value is not a recognized tag.
    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    /// The `command` value is recognized but has no handler.
    #[error("unsupported command \"{0}\"")]
    NotImplemented(String),

    /// Opaque frame is not valid base64.
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not a readable image.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// A binary frame does not carry UTF-8 text.
    #[error("binary frame is not UTF-8: {0}")]
    NonUtf8Frame(std::str::Utf8Error),

    /// The background decode task did not complete.
    #[error("image decode task failed: {0}")]
    DecodeTask(#[from] tokio::task::JoinError),

    /// Listener failed to bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested, as `host:port`.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Listener did not bind within the configured bound.
    #[error("timed out binding {0}")]
    BindTimeout(String),

    /// The lifecycle supervisor is gone.
    #[error("lifecycle control channel closed")]
    ControlChannelClosed,

    /// The lifecycle supervisor did not answer in time.
    #[error("lifecycle request timed out")]
    ControlTimeout,

    /// A blocking lifecycle call was made from inside the async runtime.
    #[error("blocking lifecycle call made from within the async runtime")]
    BlockingInRuntime,
}

impl TransceiverError {
    /// Returns the failure category for this variant.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::MalformedCommand(_) | Self::UnknownCommand(_) | Self::NotImplemented(_) => {
                ErrorKind::Protocol
            }
            Self::Base64(_) | Self::Image(_) | Self::NonUtf8Frame(_) | Self::DecodeTask(_) => {
                ErrorKind::Decode
            }
            Self::Bind { .. } | Self::BindTimeout(_) => ErrorKind::Bind,
            Self::ControlChannelClosed | Self::ControlTimeout | Self::BlockingInRuntime => {
                ErrorKind::Control
            }
        }
    }

    /// Returns `true` if this error only affects the message that caused it.
    #[must_use]
    pub const fn is_per_message(&self) -> bool {
        matches!(self.kind(), ErrorKind::Protocol | ErrorKind::Decode)
    }
}

/// Formats a bind address for error reporting.
#[must_use]
pub fn bind_addr(host: &str, port: u16) -> String {
    match host.parse::<std::net::IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{host}:{port}"),
    }
}
