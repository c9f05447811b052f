//! Room lifecycle and race coordination for the TypeRace relay.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! state and its members' outbound channels. The registry tracks live
//! rooms by code and is the only shared mutable structure.
//!
//! # Key types
//!
//! - [`Room`] — the pure state machine: membership, host succession,
//!   `waiting → countdown → racing → finished`, progress bookkeeping
//! - [`RoomRegistry`] — creates, looks up, sweeps, and deletes rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RegistryConfig`] — countdown delay, retention, sweep interval
//! - [`RoomError`] — the four ways a command can fail

mod actor;
mod config;
mod error;
mod registry;
mod room;
mod time;

pub use actor::{LeaveOutcome, PlayerSender, RoomHandle};
pub use config::RegistryConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{MAX_PLAYERS, Player, ProgressUpdate, Room};
pub use time::unix_millis;
