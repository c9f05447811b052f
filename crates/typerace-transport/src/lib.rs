//! WebSocket transport for the TypeRace relay.
//!
//! The relay speaks JSON over text frames to browser clients, one
//! persistent connection per tab. This crate owns the listener, the
//! per-connection send/recv surface, and connection identity — the
//! [`ConnectionId`] handed out here doubles as the player identity in
//! the layers above (there is no account system).

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WebSocketConnection, WebSocketListener};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Allocated from a process-wide counter on accept; never reused for
/// the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
