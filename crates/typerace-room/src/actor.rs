//! Room actor: an isolated Tokio task that owns one [`Room`] and its
//! members' outbound channels.
//!
//! All mutations of a room flow through its command channel, so
//! successive commands against one room are serialized while different
//! rooms proceed independently. Broadcast membership lives next to the
//! player map and is updated in the same command, keeping the fan-out
//! group consistent with the room's members by construction.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use typerace_protocol::{PlayerId, RoomCode, RoomPreview, RoomSnapshot, ServerMessage};

use crate::room::Room;
use crate::time::unix_millis;
use crate::RoomError;

/// Command channel capacity per room actor.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Channel sender for delivering outbound messages to one player.
///
/// Unbounded and never awaited: broadcasts are fire-and-forget, and a
/// send to a vanished receiver is silently dropped (at-most-once
/// delivery per connected client).
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a player and register their outbound channel.
    Join {
        player_id: PlayerId,
        name: String,
        car_id: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },

    /// Remove a player. The actor stops itself when the room empties.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<LeaveOutcome>,
    },

    /// Begin the countdown on behalf of `player_id`.
    StartRace {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Deferred countdown expiry. Scheduled by the actor itself; must
    /// tolerate the room having moved on or emptied in the meantime.
    BeginRacing,

    /// A progress report. Fire-and-forget.
    Progress {
        player_id: PlayerId,
        progress: f32,
        wpm: f32,
    },

    /// Request the reduced `get-room` projection.
    Preview {
        reply: oneshot::Sender<RoomPreview>,
    },

    /// Stop the actor without any broadcast (registry sweep).
    Shutdown,
}

/// What happened when a player was asked to leave.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveOutcome {
    /// The player was a member and has been removed.
    pub removed: bool,
    /// The room is now empty; the actor has stopped and the registry
    /// must drop its handle.
    pub now_empty: bool,
}

/// Handle to a running room actor. Cheap to clone.
///
/// Every method maps a closed command channel to the same observable
/// result a deleted room would give — callers cannot tell a dead actor
/// from a missing room, which is exactly the contract.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds a player to the room and returns the updated snapshot.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        car_id: String,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                name,
                car_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::RoomNotFound)?;
        reply_rx.await.map_err(|_| RoomError::RoomNotFound)?
    }

    /// Removes a player from the room.
    pub async fn leave(&self, player_id: PlayerId) -> LeaveOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return LeaveOutcome::default();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// Asks the room to start its race countdown.
    pub async fn start_race(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::StartRace {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::RoomNotFound)?;
        reply_rx.await.map_err(|_| RoomError::RoomNotFound)?
    }

    /// Delivers a progress report (fire-and-forget).
    pub async fn report_progress(&self, player_id: PlayerId, progress: f32, wpm: f32) {
        let _ = self
            .sender
            .send(RoomCommand::Progress {
                player_id,
                progress,
                wpm,
            })
            .await;
    }

    /// Requests the reduced room projection.
    pub async fn preview(&self) -> Result<RoomPreview, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Preview { reply: reply_tx })
            .await
            .map_err(|_| RoomError::RoomNotFound)?;
        reply_rx.await.map_err(|_| RoomError::RoomNotFound)
    }

    /// Tells the room actor to stop.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels; kept in lockstep with the room's
    /// player map.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Clone of the actor's own command sender, handed to the deferred
    /// countdown task. Holding only the sender (never the room) means a
    /// late timer against a stopped actor simply fails to deliver.
    self_tx: mpsc::Sender<RoomCommand>,
    countdown_delay: Duration,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::debug!(room = %self.room.code(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    car_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, name, car_id, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let outcome = self.handle_leave(player_id);
                    let _ = reply.send(outcome);
                    if outcome.now_empty {
                        tracing::info!(room = %self.room.code(), "room deleted (empty)");
                        break;
                    }
                }
                RoomCommand::StartRace { player_id, reply } => {
                    let _ = reply.send(self.handle_start(player_id));
                }
                RoomCommand::BeginRacing => self.handle_begin_racing(),
                RoomCommand::Progress {
                    player_id,
                    progress,
                    wpm,
                } => self.handle_progress(player_id, progress, wpm),
                RoomCommand::Preview { reply } => {
                    let _ = reply.send(self.room.preview());
                }
                RoomCommand::Shutdown => break,
            }
        }

        tracing::debug!(room = %self.room.code(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        car_id: String,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        if self.room.is_member(player_id) {
            // Duplicate join from the same connection: refresh the
            // outbound channel, change nothing, announce nothing.
            self.senders.insert(player_id, sender);
            return Ok(self.room.snapshot());
        }

        let player = self.room.add_player(player_id, name, car_id)?.snapshot();
        self.senders.insert(player_id, sender);
        tracing::info!(
            room = %self.room.code(),
            %player_id,
            players = self.room.player_count(),
            "player joined"
        );

        let room = self.room.snapshot();
        self.broadcast_all(ServerMessage::PlayerJoined {
            player,
            room: room.clone(),
        });
        Ok(room)
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> LeaveOutcome {
        if !self.room.remove_player(player_id) {
            return LeaveOutcome {
                removed: false,
                now_empty: false,
            };
        }
        self.senders.remove(&player_id);

        if self.room.is_empty() {
            return LeaveOutcome {
                removed: true,
                now_empty: true,
            };
        }

        tracing::info!(
            room = %self.room.code(),
            %player_id,
            players = self.room.player_count(),
            "player left"
        );
        self.broadcast_all(ServerMessage::PlayerLeft {
            player_id,
            new_host_id: self.room.host_id(),
            room: self.room.snapshot(),
        });
        LeaveOutcome {
            removed: true,
            now_empty: false,
        }
    }

    fn handle_start(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        self.room.begin_countdown(player_id)?;
        tracing::info!(room = %self.room.code(), host = %player_id, "race countdown started");

        self.broadcast_all(ServerMessage::RaceCountdown {
            room: self.room.snapshot(),
        });

        let tx = self.self_tx.clone();
        let delay = self.countdown_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The actor may be gone (everyone left, or the room was
            // swept); a failed send is the no-op we want.
            let _ = tx.send(RoomCommand::BeginRacing).await;
        });
        Ok(())
    }

    fn handle_begin_racing(&mut self) {
        let Some(start_time) = self.room.begin_racing(unix_millis()) else {
            tracing::debug!(
                room = %self.room.code(),
                state = %self.room.state(),
                "countdown expired against stale state, ignoring"
            );
            return;
        };

        tracing::info!(room = %self.room.code(), start_time, "race started");
        self.broadcast_all(ServerMessage::RaceStart {
            text: self.room.text().to_owned(),
            start_time,
            room: self.room.snapshot(),
        });
    }

    fn handle_progress(&mut self, player_id: PlayerId, progress: f32, wpm: f32) {
        let Some(update) = self
            .room
            .apply_progress(player_id, progress, wpm, unix_millis())
        else {
            return;
        };

        self.broadcast_except(
            player_id,
            ServerMessage::PlayerProgress {
                player_id,
                progress,
                wpm,
                finished: update.finished,
                finish_time: update.finish_time,
            },
        );

        // Cheap: at most MAX_PLAYERS entries, checked on every report.
        if self.room.all_finished() && self.room.finish() {
            tracing::info!(room = %self.room.code(), "race finished");
            self.broadcast_all(ServerMessage::RaceFinished {
                room: self.room.snapshot(),
            });
        }
    }

    fn broadcast_all(&self, msg: ServerMessage) {
        for sender in self.senders.values() {
            let _ = sender.send(msg.clone());
        }
    }

    fn broadcast_except(&self, excluded: PlayerId, msg: ServerMessage) {
        for (player_id, sender) in &self.senders {
            if *player_id != excluded {
                let _ = sender.send(msg.clone());
            }
        }
    }
}

/// Spawns a room actor for an already-constructed [`Room`] and returns
/// a handle to it. The creator's outbound channel is registered before
/// the first command can arrive.
pub(crate) fn spawn_room(
    room: Room,
    creator_sender: PlayerSender,
    countdown_delay: Duration,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

    let code = room.code().clone();
    let mut senders = HashMap::new();
    senders.insert(room.host_id(), creator_sender);

    let actor = RoomActor {
        room,
        senders,
        receiver: rx,
        self_tx: tx.clone(),
        countdown_delay,
    };
    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
