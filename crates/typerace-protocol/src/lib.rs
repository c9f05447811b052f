//! Wire protocol for the TypeRace relay.
//!
//! Defines the "language" spoken between browser clients and the relay:
//!
//! - **Types** ([`ClientCommand`], [`ServerMessage`], [`RoomSnapshot`],
//!   identity newtypes) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to and from text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The protocol layer knows nothing about connections or room state; it
//! only defines shapes. Field names are camelCase and message tags are
//! kebab-case, matching what the game client expects.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, PlayerId, PlayerSnapshot, RaceMode, RoomCode, RoomPreview, RoomSettings,
    RoomSnapshot, RoomState, ServerMessage,
};
