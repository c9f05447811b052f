//! Room registry: the process-wide map from room code to live room.
//!
//! Owns creation (code allocation), case-insensitive lookup, deletion,
//! and the age-based sweep. The registry never touches room state — it
//! holds actor handles plus the creation timestamp each room was born
//! with.

use std::collections::HashMap;

use typerace_protocol::{PlayerId, RoomCode, RoomPreview, RoomSettings, RoomSnapshot};

use crate::actor::{PlayerSender, RoomHandle, spawn_room};
use crate::room::Room;
use crate::time::unix_millis;
use crate::{RegistryConfig, RoomError};

struct RoomEntry {
    handle: RoomHandle,
    created_at: u64,
}

/// All live rooms, keyed by canonical (uppercase) room code.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomEntry>,
    config: RegistryConfig,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Creates a room with the caller as sole player and host.
    ///
    /// Allocates a fresh code, retrying on collision with a live room.
    pub fn create_room(
        &mut self,
        creator: PlayerId,
        name: String,
        car_id: String,
        settings: RoomSettings,
        text: String,
        sender: PlayerSender,
    ) -> (RoomCode, RoomSnapshot) {
        let code = loop {
            let candidate = RoomCode::generate();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let now = unix_millis();
        let room = Room::new(
            code.clone(),
            creator,
            name,
            car_id,
            settings,
            text,
            now,
        );
        let snapshot = room.snapshot();
        let handle = spawn_room(room, sender, self.config.countdown_delay);
        self.rooms.insert(
            code.clone(),
            RoomEntry {
                handle,
                created_at: now,
            },
        );

        tracing::info!(room = %code, %creator, "room created");
        (code, snapshot)
    }

    fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(&code.normalized())
            .map(|entry| entry.handle.clone())
            .ok_or(RoomError::RoomNotFound)
    }

    /// Drops a registry entry whose actor turned out to be gone. The
    /// handle layer reports a dead actor as `RoomNotFound`, which is
    /// also what callers should see.
    fn drop_if_dead<T>(&mut self, code: &RoomCode, result: &Result<T, RoomError>) {
        if matches!(result, Err(RoomError::RoomNotFound)) {
            self.rooms.remove(&code.normalized());
        }
    }

    /// Adds a player to the room with the given code.
    pub async fn join_room(
        &mut self,
        code: &RoomCode,
        player_id: PlayerId,
        name: String,
        car_id: String,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let handle = self.handle(code)?;
        let result = handle.join(player_id, name, car_id, sender).await;
        self.drop_if_dead(code, &result);
        result
    }

    /// Returns the reduced `get-room` projection. Unlike `join`, this
    /// succeeds in every room state.
    pub async fn get_room(&self, code: &RoomCode) -> Result<RoomPreview, RoomError> {
        self.handle(code)?.preview().await
    }

    /// Starts the race countdown in the given room.
    pub async fn start_race(
        &mut self,
        code: &RoomCode,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let handle = self.handle(code)?;
        let result = handle.start_race(player_id).await;
        self.drop_if_dead(code, &result);
        result
    }

    /// Forwards a progress report. Silent no-op if the room is absent —
    /// late or stray reports are dropped, not errored.
    pub async fn report_progress(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
        progress: f32,
        wpm: f32,
    ) {
        if let Ok(handle) = self.handle(code) {
            handle.report_progress(player_id, progress, wpm).await;
        }
    }

    /// Removes a player from the given room, deleting the room if it
    /// emptied. No-op if the room is absent.
    pub async fn leave_room(&mut self, code: &RoomCode, player_id: PlayerId) {
        let Ok(handle) = self.handle(code) else {
            return;
        };
        let outcome = handle.leave(player_id).await;
        if outcome.now_empty {
            self.rooms.remove(&code.normalized());
        }
    }

    /// Removes a closed connection from every room it belongs to.
    ///
    /// A connection is only ever in one room in practice, but the sweep
    /// is deliberately exhaustive — every room is asked, and the ones
    /// that empty out are deleted.
    pub async fn remove_from_all(&mut self, player_id: PlayerId) {
        let handles: Vec<(RoomCode, RoomHandle)> = self
            .rooms
            .iter()
            .map(|(code, entry)| (code.clone(), entry.handle.clone()))
            .collect();

        for (code, handle) in handles {
            let outcome = handle.leave(player_id).await;
            if outcome.now_empty {
                self.rooms.remove(&code);
            }
        }
    }

    /// Removes a room outright, stopping its actor without a broadcast.
    /// Idempotent — deleting an absent code is a no-op.
    pub async fn delete_room(&mut self, code: &RoomCode) {
        if let Some(entry) = self.rooms.remove(&code.normalized()) {
            entry.handle.shutdown().await;
            tracing::info!(room = %code, "room deleted");
        }
    }

    /// Deletes every room created more than the configured retention
    /// window before `now_ms`, regardless of state. No broadcast fires;
    /// connections holding a stale code get `RoomNotFound` on their
    /// next command. Returns the number of rooms removed.
    pub async fn sweep(&mut self, now_ms: u64) -> usize {
        let max_age = self.config.room_max_age.as_millis() as u64;
        let cutoff = now_ms.saturating_sub(max_age);

        let expired: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, entry)| entry.created_at < cutoff)
            .map(|(code, _)| code.clone())
            .collect();

        for code in &expired {
            if let Some(entry) = self.rooms.remove(code) {
                entry.handle.shutdown().await;
                tracing::info!(room = %code, "swept stale room");
            }
        }
        expired.len()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Codes of all live rooms.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
