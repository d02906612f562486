//! Transceiver configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key is optional and falls back
//! to the defaults listed on [`TransceiverConfig`].

use std::time::Duration;

use crate::domain::ServerConfig;

/// Port the listener binds to when `TRANSCEIVER_PORT` is not set.
pub const DEFAULT_PORT: u16 = 8765;

/// Largest single inbound message the transport accepts (1 GiB).
pub const MAX_MESSAGE_SIZE: usize = 1_073_741_824;

/// Top-level transceiver configuration.
///
/// Loaded once at startup via [`TransceiverConfig::from_env`].
#[derive(Debug, Clone)]
pub struct TransceiverConfig {
    /// Host name or address the listener binds to (default `localhost`).
    pub host: String,

    /// Initial listener port; seeds [`ServerConfig::port`].
    pub port: u16,

    /// Maximum size in bytes of one inbound WebSocket message.
    pub max_message_size: usize,

    /// Upper bound on how long `start` waits for the listener to bind.
    pub bind_timeout: Duration,

    /// Pause between `stop` and `start` during a restart.
    pub restart_settle: Duration,

    /// How long `stop` waits for the listener task to unwind before aborting it.
    pub stop_timeout: Duration,

    /// Upper bound on a lifecycle request round trip through the control channel.
    pub control_timeout: Duration,

    /// Capacity of the notification broadcast channel.
    pub notification_capacity: usize,

    /// Whether the binary starts the listener immediately.
    pub autostart: bool,
}

impl Default for TransceiverConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            max_message_size: MAX_MESSAGE_SIZE,
            bind_timeout: Duration::from_millis(300),
            restart_settle: Duration::from_millis(250),
            stop_timeout: Duration::from_millis(1000),
            control_timeout: Duration::from_millis(2000),
            notification_capacity: 64,
            autostart: true,
        }
    }
}

impl TransceiverConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Missing or unparsable values fall back to [`Default`].
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            host: std::env::var("TRANSCEIVER_HOST").unwrap_or(defaults.host),
            port: parse_env("TRANSCEIVER_PORT", defaults.port),
            max_message_size: parse_env("TRANSCEIVER_MAX_MESSAGE_SIZE", defaults.max_message_size),
            bind_timeout: parse_env_millis("TRANSCEIVER_BIND_TIMEOUT_MS", defaults.bind_timeout),
            restart_settle: parse_env_millis(
                "TRANSCEIVER_RESTART_SETTLE_MS",
                defaults.restart_settle,
            ),
            stop_timeout: parse_env_millis("TRANSCEIVER_STOP_TIMEOUT_MS", defaults.stop_timeout),
            control_timeout: parse_env_millis(
                "TRANSCEIVER_CONTROL_TIMEOUT_MS",
                defaults.control_timeout,
            ),
            notification_capacity: parse_env(
                "TRANSCEIVER_NOTIFICATION_CAPACITY",
                defaults.notification_capacity,
            ),
            autostart: parse_env_bool("TRANSCEIVER_AUTOSTART", defaults.autostart),
        }
    }

    /// Returns the initial [`ServerConfig`] derived from this configuration.
    #[must_use]
    pub const fn server_config(&self) -> ServerConfig {
        ServerConfig { port: self.port }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a millisecond count.
fn parse_env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("TRUE") | Some("1") => true,
        Some("false") | Some("FALSE") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_contract() {
        let config = TransceiverConfig::default();
        assert_eq!(config.port, 8765);
        assert_eq!(config.max_message_size, 1 << 30);
        assert!(config.bind_timeout <= Duration::from_millis(300));
        assert_eq!(config.server_config().port, 8765);
    }

    #[test]
    fn unset_variable_uses_default() {
        assert_eq!(parse_env("TRANSCEIVER_TEST_UNSET_KEY", 42_u16), 42);
        assert!(parse_env_bool("TRANSCEIVER_TEST_UNSET_KEY", true));
        assert_eq!(
            parse_env_millis("TRANSCEIVER_TEST_UNSET_KEY", Duration::from_millis(7)),
            Duration::from_millis(7)
        );
    }
}
