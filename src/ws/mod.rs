//! WebSocket layer: upgrade handling and the per-connection relay loop.
//!
//! Every path on the listener accepts a WebSocket upgrade. Each connection
//! is served by its own task that processes frames strictly in order.

pub mod connection;
pub mod handler;
