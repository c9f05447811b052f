//! Unified error type for the relay.

use typerace_protocol::ProtocolError;
use typerace_room::RoomError;
use typerace_transport::TransportError;

/// Top-level error wrapping each layer's error type.
///
/// `#[from]` lets `?` convert sub-crate errors automatically, so server
/// and handler code deals with one error type.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, full, not host).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::other("gone"));
        let relay_err: RelayError = err.into();
        assert!(matches!(relay_err, RelayError::Transport(_)));
        assert!(relay_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_room_error_keeps_wire_message() {
        let relay_err: RelayError = RoomError::RoomNotFound.into();
        assert!(matches!(relay_err, RelayError::Room(_)));
        assert_eq!(relay_err.to_string(), "Room not found");
    }
}
