//! Listener settings that can change at runtime.

use std::sync::Arc;

use tokio::sync::RwLock;

/// Mutable listener configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port the listener binds to on its next start.
    pub port: u16,
}

/// Shared [`ServerConfig`] cell.
///
/// Written by the control command protocol, read by the lifecycle
/// supervisor whenever it binds.
#[derive(Debug, Clone)]
pub struct SharedServerConfig {
    inner: Arc<RwLock<ServerConfig>>,
}

impl SharedServerConfig {
    /// Wraps an initial configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Returns a copy of the current configuration.
    pub async fn get(&self) -> ServerConfig {
        *self.inner.read().await
    }

    /// Returns the configured port.
    pub async fn port(&self) -> u16 {
        self.inner.read().await.port
    }

    /// Sets the port and returns the previous value.
    pub async fn set_port(&self, port: u16) -> u16 {
        let mut config = self.inner.write().await;
        std::mem::replace(&mut config.port, port)
    }
}
