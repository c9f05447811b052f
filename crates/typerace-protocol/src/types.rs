//! Core wire types for the relay protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identity: the numeric id of their connection.
///
/// There is no account system — a player exists exactly as long as their
/// connection does, and the connection id doubles as the player id.
/// Serializes as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p-{}", self.0)
    }
}

/// A six-character room code, doubling as the invite token players type
/// or share.
///
/// Codes are drawn from an alphabet that excludes visually confusable
/// characters (no `0`/`O`, no `1`/`I`). Stored codes are always
/// uppercase; client-supplied codes are normalized with
/// [`RoomCode::normalized`] before lookup, so `ab2cd3` finds `AB2CD3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Code length in characters.
    pub const LEN: usize = 6;

    /// The unambiguous uppercase alphanumeric alphabet codes are drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Generates a fresh random code.
    ///
    /// Uniqueness is the registry's job — it retries on the (unlikely)
    /// collision with a live room.
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let code = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.random_range(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Returns the canonical (trimmed, uppercase) form of this code.
    pub fn normalized(&self) -> Self {
        Self(self.0.trim().to_ascii_uppercase())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Room settings and lifecycle state
// ---------------------------------------------------------------------------

/// Whether a room races against others or alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RaceMode {
    #[default]
    Multiplayer,
    Solo,
}

/// Race configuration, captured when the room is created and immutable
/// afterwards. All fields are client-chosen presentation knobs; the
/// relay only relays them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomSettings {
    pub word_count: u32,
    pub include_capitals: bool,
    /// Clients call this `useAI`, which camelCase renaming won't produce.
    #[serde(rename = "useAI")]
    pub use_ai: bool,
    pub mode: RaceMode,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            word_count: 25,
            include_capitals: false,
            use_ai: false,
            mode: RaceMode::Multiplayer,
        }
    }
}

/// The lifecycle state of a room.
///
/// Transitions are strictly forward — no skipping, no regression:
///
/// ```text
/// waiting → countdown → racing → finished
/// ```
///
/// `finished` is terminal; a new race needs a new room. The derived
/// `Ord` follows that order, so observed states over a room's lifetime
/// form a non-decreasing sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Countdown,
    Racing,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The next state in the strict forward order, or `None` from the
    /// terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Countdown),
            Self::Countdown => Some(Self::Racing),
            Self::Racing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if advancing to `target` is a valid single step.
    pub fn can_advance_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Countdown => write!(f, "countdown"),
            Self::Racing => write!(f, "racing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots (server → client projections)
// ---------------------------------------------------------------------------

/// One racer as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub car_id: String,
    /// Last reported completion percentage (0–100).
    pub progress: f32,
    /// Last reported words-per-minute, client-computed.
    pub wpm: f32,
    pub finished: bool,
    /// Milliseconds from race start to this player's finish, once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<u64>,
}

/// The full room as broadcast to members.
///
/// `text` is the empty string while the room is `waiting` — the passage
/// is withheld until racing begins so nobody can pre-read it. That is a
/// fairness property, not an optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomCode,
    pub host_id: PlayerId,
    /// Players in join order.
    pub players: Vec<PlayerSnapshot>,
    pub settings: RoomSettings,
    pub state: RoomState,
    pub text: String,
    /// Wall-clock millis of race start, set once racing begins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

/// The reduced projection returned by `get-room`, used by join-preview
/// and reconnect-probing flows. Never includes the race text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPreview {
    pub id: RoomCode,
    pub player_count: usize,
    pub state: RoomState,
    pub settings: RoomSettings,
}

// ---------------------------------------------------------------------------
// Client → server commands
// ---------------------------------------------------------------------------

/// Commands a client can send.
///
/// Cosmetic fields (`playerName`, `carId`, `settings`, `text`) default
/// when absent rather than failing to parse; structural fields
/// (`roomId`, `progress`) are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Create a room with the caller as sole player and host.
    CreateRoom {
        #[serde(default)]
        player_name: String,
        #[serde(default)]
        car_id: String,
        #[serde(default)]
        settings: RoomSettings,
        /// The race passage, generated client-side at creation.
        #[serde(default)]
        text: String,
    },

    /// Join an existing room by code.
    JoinRoom {
        room_id: RoomCode,
        #[serde(default)]
        player_name: String,
        #[serde(default)]
        car_id: String,
    },

    /// Fetch the reduced room preview (works in any state).
    GetRoom { room_id: RoomCode },

    /// Begin the race countdown. Host only.
    StartRace { room_id: RoomCode },

    /// Report typing progress. Fire-and-forget: no ack, stray reports
    /// are dropped silently.
    RaceProgress {
        room_id: RoomCode,
        progress: f32,
        wpm: f32,
    },

    /// Leave the room. Fire-and-forget.
    LeaveRoom { room_id: RoomCode },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Everything the relay sends: the welcome, command acks, and
/// room-scoped broadcasts.
///
/// Ack variants carry `success` plus either their payload or an `error`
/// string, mirroring the `{success, ...}` / `{success: false, error}`
/// acknowledgement contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once when a connection is accepted, so the client learns
    /// the id it will appear under in room snapshots.
    Connected { player_id: PlayerId },

    // -- Command acks --
    /// Reply to `create-room`.
    RoomCreated {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomSnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to `join-room`.
    RoomJoined {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomSnapshot>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to `get-room`.
    RoomInfo {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomPreview>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Reply to `start-race`. Success means the countdown began; the
    /// transition to racing arrives later as a `race-start` broadcast.
    RaceStarting {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Room broadcasts --
    /// A player joined; sent to every member including the joiner.
    PlayerJoined {
        player: PlayerSnapshot,
        room: RoomSnapshot,
    },

    /// A player left; sent to the remaining members.
    PlayerLeft {
        player_id: PlayerId,
        new_host_id: PlayerId,
        room: RoomSnapshot,
    },

    /// The host started the race; the countdown is running.
    RaceCountdown { room: RoomSnapshot },

    /// The countdown elapsed — racing begins and the text is revealed.
    RaceStart {
        text: String,
        start_time: u64,
        room: RoomSnapshot,
    },

    /// Another player's progress report; never echoed to the reporter.
    PlayerProgress {
        player_id: PlayerId,
        progress: f32,
        wpm: f32,
        finished: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish_time: Option<u64>,
    },

    /// Every player has finished; the room is done.
    RaceFinished { room: RoomSnapshot },
}

impl ServerMessage {
    /// Successful `create-room` ack.
    pub fn room_created(room_id: RoomCode, room: RoomSnapshot) -> Self {
        Self::RoomCreated {
            success: true,
            room_id: Some(room_id),
            room: Some(room),
            error: None,
        }
    }

    /// Successful `join-room` ack.
    pub fn room_joined(room: RoomSnapshot) -> Self {
        Self::RoomJoined {
            success: true,
            room: Some(room),
            error: None,
        }
    }

    /// Failed `join-room` ack.
    pub fn join_failed(error: impl ToString) -> Self {
        Self::RoomJoined {
            success: false,
            room: None,
            error: Some(error.to_string()),
        }
    }

    /// Successful `get-room` ack.
    pub fn room_info(room: RoomPreview) -> Self {
        Self::RoomInfo {
            success: true,
            room: Some(room),
            error: None,
        }
    }

    /// Failed `get-room` ack.
    pub fn room_info_failed(error: impl ToString) -> Self {
        Self::RoomInfo {
            success: false,
            room: None,
            error: Some(error.to_string()),
        }
    }

    /// Successful `start-race` ack.
    pub fn race_starting() -> Self {
        Self::RaceStarting {
            success: true,
            error: None,
        }
    }

    /// Failed `start-race` ack.
    pub fn start_failed(error: impl ToString) -> Self {
        Self::RaceStarting {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The game client parses these exact JSON shapes; the tests pin
    //! tags, field casing, and optional-field omission.

    use super::*;

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            id: RoomCode::from("AB2CD3"),
            host_id: PlayerId(1),
            players: vec![PlayerSnapshot {
                id: PlayerId(1),
                name: "Player".into(),
                car_id: "c1".into(),
                progress: 0.0,
                wpm: 0.0,
                finished: false,
                finish_time: None,
            }],
            settings: RoomSettings::default(),
            state: RoomState::Waiting,
            text: String::new(),
            start_time: None,
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(42)).unwrap(), "42");
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_room_code_serializes_as_plain_string() {
        let code = RoomCode::from("AB2CD3");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"AB2CD3\"");
        let parsed: RoomCode = serde_json::from_str("\"ab2cd3\"").unwrap();
        assert_eq!(parsed.normalized(), code);
    }

    #[test]
    fn test_room_code_generate_format() {
        let code = RoomCode::generate();
        assert_eq!(code.as_str().len(), RoomCode::LEN);
        assert!(
            code.as_str()
                .bytes()
                .all(|b| RoomCode::ALPHABET.contains(&b))
        );
    }

    #[test]
    fn test_room_code_alphabet_has_no_confusable_chars() {
        for confusable in [b'0', b'O', b'1', b'I'] {
            assert!(!RoomCode::ALPHABET.contains(&confusable));
        }
    }

    #[test]
    fn test_room_code_generate_uniqueness() {
        let codes: std::collections::HashSet<_> =
            (0..100).map(|_| RoomCode::generate()).collect();
        // 32^6 possibilities — 100 draws colliding would indicate a bug.
        assert_eq!(codes.len(), 100);
    }

    #[test]
    fn test_room_code_normalized_uppercases_and_trims() {
        assert_eq!(
            RoomCode::from(" ab2cd3 ").normalized(),
            RoomCode::from("AB2CD3")
        );
    }

    // =====================================================================
    // RoomState
    // =====================================================================

    #[test]
    fn test_room_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoomState::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&RoomState::Countdown).unwrap(),
            "\"countdown\""
        );
    }

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Waiting.next(), Some(RoomState::Countdown));
        assert_eq!(RoomState::Countdown.next(), Some(RoomState::Racing));
        assert_eq!(RoomState::Racing.next(), Some(RoomState::Finished));
        assert_eq!(RoomState::Finished.next(), None);
    }

    #[test]
    fn test_room_state_can_advance_to() {
        assert!(RoomState::Waiting.can_advance_to(RoomState::Countdown));
        assert!(!RoomState::Waiting.can_advance_to(RoomState::Racing));
        assert!(!RoomState::Finished.can_advance_to(RoomState::Waiting));
    }

    #[test]
    fn test_room_state_order_is_non_decreasing() {
        assert!(RoomState::Waiting < RoomState::Countdown);
        assert!(RoomState::Countdown < RoomState::Racing);
        assert!(RoomState::Racing < RoomState::Finished);
    }

    #[test]
    fn test_room_state_is_joinable_only_while_waiting() {
        assert!(RoomState::Waiting.is_joinable());
        assert!(!RoomState::Countdown.is_joinable());
        assert!(!RoomState::Racing.is_joinable());
        assert!(!RoomState::Finished.is_joinable());
    }

    // =====================================================================
    // Settings
    // =====================================================================

    #[test]
    fn test_room_settings_defaults_from_empty_object() {
        let settings: RoomSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, RoomSettings::default());
        assert_eq!(settings.mode, RaceMode::Multiplayer);
    }

    #[test]
    fn test_room_settings_camel_case_fields() {
        let json: serde_json::Value =
            serde_json::to_value(RoomSettings::default()).unwrap();
        assert!(json.get("wordCount").is_some());
        assert!(json.get("includeCapitals").is_some());
        assert!(json.get("useAI").is_some(), "clients expect useAI, not useAi");
        assert_eq!(json["mode"], "multiplayer");
    }

    // =====================================================================
    // Commands
    // =====================================================================

    #[test]
    fn test_create_room_command_parses() {
        let json = r#"{
            "type": "create-room",
            "playerName": "Mia",
            "carId": "c3",
            "settings": {"wordCount": 10, "includeCapitals": true, "useAI": false, "mode": "multiplayer"},
            "text": "the quick brown fox"
        }"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ClientCommand::CreateRoom {
                player_name,
                car_id,
                settings,
                text,
            } => {
                assert_eq!(player_name, "Mia");
                assert_eq!(car_id, "c3");
                assert_eq!(settings.word_count, 10);
                assert!(settings.include_capitals);
                assert_eq!(text, "the quick brown fox");
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_create_room_cosmetic_fields_default_when_missing() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type": "create-room"}"#).unwrap();
        match cmd {
            ClientCommand::CreateRoom {
                player_name,
                car_id,
                settings,
                text,
            } => {
                assert!(player_name.is_empty());
                assert!(car_id.is_empty());
                assert_eq!(settings, RoomSettings::default());
                assert!(text.is_empty());
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_join_room_requires_room_id() {
        let result: Result<ClientCommand, _> =
            serde_json::from_str(r#"{"type": "join-room", "playerName": "Mia"}"#);
        assert!(result.is_err(), "roomId is structural, not defaulted");
    }

    #[test]
    fn test_race_progress_command_parses() {
        let json = r#"{"type": "race-progress", "roomId": "AB2CD3", "progress": 54.5, "wpm": 88.0}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::RaceProgress {
                room_id: RoomCode::from("AB2CD3"),
                progress: 54.5,
                wpm: 88.0,
            }
        );
    }

    #[test]
    fn test_unknown_command_type_fails() {
        let result: Result<ClientCommand, _> =
            serde_json::from_str(r#"{"type": "fly-to-moon"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // Server messages
    // =====================================================================

    #[test]
    fn test_player_joined_json_shape() {
        let room = snapshot();
        let msg = ServerMessage::PlayerJoined {
            player: room.players[0].clone(),
            room,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "player-joined");
        assert_eq!(json["player"]["carId"], "c1");
        assert_eq!(json["room"]["hostId"], 1);
        assert_eq!(json["room"]["state"], "waiting");
    }

    #[test]
    fn test_waiting_room_snapshot_omits_start_time() {
        let json: serde_json::Value = serde_json::to_value(snapshot()).unwrap();
        assert_eq!(json["text"], "");
        assert!(json.get("startTime").is_none());
    }

    #[test]
    fn test_player_progress_omits_unset_finish_time() {
        let msg = ServerMessage::PlayerProgress {
            player_id: PlayerId(2),
            progress: 40.0,
            wpm: 61.5,
            finished: false,
            finish_time: None,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "player-progress");
        assert_eq!(json["playerId"], 2);
        assert!(json.get("finishTime").is_none());

        let msg = ServerMessage::PlayerProgress {
            player_id: PlayerId(2),
            progress: 100.0,
            wpm: 61.5,
            finished: true,
            finish_time: Some(48_210),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["finishTime"], 48_210);
    }

    #[test]
    fn test_ack_constructors_shape() {
        let ok = ServerMessage::room_created(RoomCode::from("AB2CD3"), snapshot());
        let json: serde_json::Value = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["type"], "room-created");
        assert_eq!(json["success"], true);
        assert_eq!(json["roomId"], "AB2CD3");
        assert!(json.get("error").is_none());

        let err = ServerMessage::join_failed("Room not found");
        let json: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "room-joined");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Room not found");
        assert!(json.get("room").is_none());
    }

    #[test]
    fn test_race_start_broadcast_shape() {
        let mut room = snapshot();
        room.state = RoomState::Racing;
        room.text = "the quick brown fox".into();
        room.start_time = Some(1_700_000_000_000);
        let msg = ServerMessage::RaceStart {
            text: room.text.clone(),
            start_time: 1_700_000_000_000,
            room,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "race-start");
        assert_eq!(json["startTime"], 1_700_000_000_000u64);
        assert_eq!(json["room"]["text"], "the quick brown fox");
    }

    #[test]
    fn test_connected_welcome_shape() {
        let json: serde_json::Value =
            serde_json::to_value(ServerMessage::Connected {
                player_id: PlayerId(9),
            })
            .unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["playerId"], 9);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<ServerMessage, _> = serde_json::from_str("not json at all");
        assert!(result.is_err());
    }
}
