//! Networking layer for client-host communication.
//!
//! Messages are bincode-encoded and framed with a 4-byte little-endian
//! length prefix over TCP. Both sides run on Tokio.

/// TCP client for connecting to a session host.
pub mod client;

/// Framing and serialization errors.
pub mod errors;

/// Message types for the client-host protocol.
pub mod messages;

/// Host accept loop and per-connection tasks.
pub mod server;

/// Utilities for binary message serialization and framing.
pub mod utils;
