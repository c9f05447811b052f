//! # TypeRace relay
//!
//! The coordination server for the TypeRace typing game: clients
//! connect over WebSocket, create or join four-player rooms by
//! six-character code, and the relay arbitrates race start, fans out
//! live progress, and resolves completion.
//!
//! The relay is authoritative for room membership and lifecycle only —
//! typing progress and WPM are client-reported and relayed as-is.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use typerace::RelayServerBuilder;
//!
//! # async fn run() -> Result<(), typerace::RelayError> {
//! let server = RelayServerBuilder::new().bind("0.0.0.0:3000").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

pub mod prelude {
    pub use typerace_protocol::{
        ClientCommand, Codec, JsonCodec, PlayerId, PlayerSnapshot, RaceMode, RoomCode,
        RoomPreview, RoomSettings, RoomSnapshot, RoomState, ServerMessage,
    };
    pub use typerace_room::{MAX_PLAYERS, RegistryConfig, RoomError, RoomRegistry};

    pub use crate::{RelayError, RelayServer, RelayServerBuilder};
}
