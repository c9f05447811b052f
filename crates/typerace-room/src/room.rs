//! The pure room state machine: membership, host succession, lifecycle
//! transitions, and race bookkeeping.
//!
//! Nothing here is async and nothing here broadcasts — the actor layer
//! drives this type and fans the resulting events out. That keeps every
//! invariant testable with plain synchronous tests.

use std::collections::HashMap;

use typerace_protocol::{
    PlayerId, PlayerSnapshot, RoomCode, RoomPreview, RoomSettings, RoomSnapshot, RoomState,
};

use crate::RoomError;

/// Player slots per room.
pub const MAX_PLAYERS: usize = 4;

/// Name used when a client sends an empty or missing player name.
const DEFAULT_NAME: &str = "Player";

/// Car used when a client sends an empty or missing car id.
const DEFAULT_CAR: &str = "c1";

/// One racer within a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub car_id: String,
    /// Last reported completion percentage. Client-reported and trusted;
    /// the relay only inspects it for the finish threshold.
    pub progress: f32,
    pub wpm: f32,
    pub finished: bool,
    pub finish_time: Option<u64>,
    /// Monotonic per-room counter stamped at join; host succession picks
    /// the smallest surviving value rather than trusting map order.
    join_seq: u64,
}

impl Player {
    fn new(id: PlayerId, name: String, car_id: String, join_seq: u64) -> Self {
        let name = if name.trim().is_empty() {
            DEFAULT_NAME.to_owned()
        } else {
            name
        };
        let car_id = if car_id.trim().is_empty() {
            DEFAULT_CAR.to_owned()
        } else {
            car_id
        };
        Self {
            id,
            name,
            car_id,
            progress: 0.0,
            wpm: 0.0,
            finished: false,
            finish_time: None,
            join_seq,
        }
    }

    /// The wire projection of this player.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            car_id: self.car_id.clone(),
            progress: self.progress,
            wpm: self.wpm,
            finished: self.finished,
            finish_time: self.finish_time,
        }
    }
}

/// The outcome of an applied progress report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub finished: bool,
    pub finish_time: Option<u64>,
}

/// The authoritative record of one race.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host_id: PlayerId,
    players: HashMap<PlayerId, Player>,
    settings: RoomSettings,
    state: RoomState,
    text: String,
    created_at: u64,
    start_time: Option<u64>,
    next_join_seq: u64,
}

impl Room {
    /// Creates a room with the creator as sole member and host, in the
    /// `waiting` state.
    pub fn new(
        code: RoomCode,
        creator: PlayerId,
        name: String,
        car_id: String,
        settings: RoomSettings,
        text: String,
        created_at: u64,
    ) -> Self {
        let mut players = HashMap::new();
        players.insert(creator, Player::new(creator, name, car_id, 0));
        Self {
            code,
            host_id: creator,
            players,
            settings,
            state: RoomState::Waiting,
            text,
            created_at,
            start_time: None,
            next_join_seq: 1,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host_id(&self) -> PlayerId {
        self.host_id
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Adds a player with zeroed race state.
    ///
    /// Fails with [`RoomError::RaceInProgress`] once the room has left
    /// `waiting`, and with [`RoomError::RoomFull`] at [`MAX_PLAYERS`].
    /// Callers must check [`is_member`](Self::is_member) first; joining
    /// twice would reset the player's join order.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: String,
        car_id: String,
    ) -> Result<&Player, RoomError> {
        if self.state != RoomState::Waiting {
            return Err(RoomError::RaceInProgress);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull);
        }
        let seq = self.next_join_seq;
        self.next_join_seq += 1;
        let player = Player::new(id, name, car_id, seq);
        Ok(self.players.entry(id).or_insert(player))
    }

    /// Removes a player, re-electing the host if needed.
    ///
    /// The new host is the oldest surviving member by join order. Returns
    /// `false` if the player was not a member (nothing changes).
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if self.players.remove(&id).is_none() {
            return false;
        }
        if self.host_id == id {
            if let Some(oldest) = self.players.values().min_by_key(|p| p.join_seq) {
                self.host_id = oldest.id;
            }
        }
        true
    }

    /// Moves `waiting → countdown` on behalf of the host.
    pub fn begin_countdown(&mut self, requester: PlayerId) -> Result<(), RoomError> {
        if requester != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.state != RoomState::Waiting {
            return Err(RoomError::RaceInProgress);
        }
        self.state = RoomState::Countdown;
        Ok(())
    }

    /// Moves `countdown → racing`, stamping the start time.
    ///
    /// Returns the stamped start time, or `None` if the room is not in
    /// countdown — the deferred timer calls this unconditionally and
    /// relies on the `None` case to no-op against stale state.
    pub fn begin_racing(&mut self, now_ms: u64) -> Option<u64> {
        if self.state != RoomState::Countdown {
            return None;
        }
        self.state = RoomState::Racing;
        self.start_time = Some(now_ms);
        Some(now_ms)
    }

    /// Applies a progress report.
    ///
    /// Returns `None` (report dropped) unless the room is racing and the
    /// reporter is a member. The first report at or past 100% marks the
    /// player finished and stamps their finish time; both are permanent —
    /// later reports update `progress`/`wpm` but can never un-finish.
    pub fn apply_progress(
        &mut self,
        id: PlayerId,
        progress: f32,
        wpm: f32,
        now_ms: u64,
    ) -> Option<ProgressUpdate> {
        if self.state != RoomState::Racing {
            return None;
        }
        let start_time = self.start_time.unwrap_or(now_ms);
        let player = self.players.get_mut(&id)?;

        player.progress = progress;
        player.wpm = wpm;
        if progress >= 100.0 && !player.finished {
            player.finished = true;
            player.finish_time = Some(now_ms.saturating_sub(start_time));
        }

        Some(ProgressUpdate {
            finished: player.finished,
            finish_time: player.finish_time,
        })
    }

    /// Whether every current member has finished.
    pub fn all_finished(&self) -> bool {
        !self.players.is_empty() && self.players.values().all(|p| p.finished)
    }

    /// Moves `racing → finished`. Returns `false` (and does nothing)
    /// from any other state, which keeps the transition single-shot.
    pub fn finish(&mut self) -> bool {
        if self.state != RoomState::Racing {
            return false;
        }
        self.state = RoomState::Finished;
        true
    }

    /// The full wire projection, with the race text withheld while the
    /// room is still `waiting`.
    pub fn snapshot(&self) -> RoomSnapshot {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.join_seq);
        RoomSnapshot {
            id: self.code.clone(),
            host_id: self.host_id,
            players: players.into_iter().map(Player::snapshot).collect(),
            settings: self.settings.clone(),
            state: self.state,
            text: if self.state == RoomState::Waiting {
                String::new()
            } else {
                self.text.clone()
            },
            start_time: self.start_time,
        }
    }

    /// The reduced projection served by `get-room`.
    pub fn preview(&self) -> RoomPreview {
        RoomPreview {
            id: self.code.clone(),
            player_count: self.players.len(),
            state: self.state,
            settings: self.settings.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
