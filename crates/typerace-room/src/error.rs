//! Error types for the room layer.

/// Errors reported to clients through command acknowledgements.
///
/// The display strings are part of the wire contract — clients show
/// them verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room with that code (or the room has since been deleted).
    #[error("Room not found")]
    RoomNotFound,

    /// The room has left the `waiting` state.
    #[error("Race already in progress")]
    RaceInProgress,

    /// All player slots are taken.
    #[error("Room is full (max 4 players)")]
    RoomFull,

    /// `start-race` from a connection that is not the host.
    #[error("Only host can start the race")]
    NotHost,
}
