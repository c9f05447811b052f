//! Per-connection gateway: maps inbound commands to registry and room
//! operations, and pumps outbound messages back to the socket.
//!
//! Each accepted connection gets its own task running this handler.
//! The connection id doubles as the player id — there is no handshake
//! and no account; a player exists for exactly as long as their socket.

use std::sync::Arc;

use tokio::sync::mpsc;
use typerace_protocol::{ClientCommand, Codec, PlayerId, ServerMessage};
use typerace_transport::WebSocketConnection;

use crate::RelayError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec + Clone>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), RelayError> {
    let player_id = PlayerId(conn.id().into_inner());
    tracing::info!(%player_id, "client connected");

    // All outbound traffic — acks and room broadcasts alike — funnels
    // through one queue per connection, so message order matches the
    // order mutations were applied.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let writer = conn.clone();
    let codec = state.codec.clone();
    let forward = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            match codec.encode(&msg) {
                Ok(text) => {
                    if writer.send(&text).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode outbound message"),
            }
        }
    });

    // Tell the client the id it will appear under in room snapshots.
    let _ = out_tx.send(ServerMessage::Connected { player_id });

    loop {
        let text = match conn.recv().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!(%player_id, "client disconnected");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let command: ClientCommand = match state.codec.decode(&text) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode command");
                continue;
            }
        };

        dispatch(&state, player_id, &out_tx, command).await;
    }

    // The connection is gone: defensively remove the player from every
    // room, not just the one they are believed to be in.
    state.registry.lock().await.remove_from_all(player_id).await;
    forward.abort();
    Ok(())
}

/// Routes one command to the registry and queues the ack, if any.
async fn dispatch<C: Codec>(
    state: &Arc<ServerState<C>>,
    player_id: PlayerId,
    out: &mpsc::UnboundedSender<ServerMessage>,
    command: ClientCommand,
) {
    match command {
        ClientCommand::CreateRoom {
            player_name,
            car_id,
            settings,
            text,
        } => {
            let (code, room) = state.registry.lock().await.create_room(
                player_id,
                player_name,
                car_id,
                settings,
                text,
                out.clone(),
            );
            let _ = out.send(ServerMessage::room_created(code, room));
        }

        ClientCommand::JoinRoom {
            room_id,
            player_name,
            car_id,
        } => {
            let result = state
                .registry
                .lock()
                .await
                .join_room(&room_id, player_id, player_name, car_id, out.clone())
                .await;
            let _ = out.send(match result {
                Ok(room) => ServerMessage::room_joined(room),
                Err(e) => ServerMessage::join_failed(e),
            });
        }

        ClientCommand::GetRoom { room_id } => {
            let result = state.registry.lock().await.get_room(&room_id).await;
            let _ = out.send(match result {
                Ok(preview) => ServerMessage::room_info(preview),
                Err(e) => ServerMessage::room_info_failed(e),
            });
        }

        ClientCommand::StartRace { room_id } => {
            let result = state
                .registry
                .lock()
                .await
                .start_race(&room_id, player_id)
                .await;
            let _ = out.send(match result {
                Ok(()) => ServerMessage::race_starting(),
                Err(e) => ServerMessage::start_failed(e),
            });
        }

        // Fire-and-forget: no ack channel exists, so a stray report
        // against a missing room is dropped, not errored.
        ClientCommand::RaceProgress {
            room_id,
            progress,
            wpm,
        } => {
            state
                .registry
                .lock()
                .await
                .report_progress(&room_id, player_id, progress, wpm)
                .await;
        }

        ClientCommand::LeaveRoom { room_id } => {
            state
                .registry
                .lock()
                .await
                .leave_room(&room_id, player_id)
                .await;
        }
    }
}
