//! Public-plane room stream: `GET /stream/{room}` (§4.7, §6.3).
//!
//! Grounded on `openibank_api::websocket::ws_market_handler`'s
//! `WebSocketUpgrade` + `ws.on_upgrade` idiom and its send-task/recv-loop
//! split, generalized from a market broadcast channel carrying JSON text
//! frames to a per-agent room carrying binary CRDT snapshot/update frames
//! ("binary message").

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use dualplane_projector::AgentDocument;
use dualplane_types::AgentId;

use crate::state::AppState;

/// `room` is the path segment following `agent:`, e.g. `/stream/agent:foo`
/// carries `room = "agent:foo"`; the agent id is recovered by stripping
/// the `agent:` prefix the room-naming convention always applies (spec
/// §6.3, `room = "agent:{agentId}"`).
pub async fn stream_handler( ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> impl IntoResponse {
    let agent_id = AgentId::new(room.strip_prefix("agent:").unwrap_or(&room).to_string());
    ws.on_upgrade(move |socket| handle_room_socket(socket, state, agent_id))
}

async fn handle_room_socket(mut socket: WebSocket, state: AppState, agent_id: AgentId) {
    let (snapshot, mut updates) = state.rooms.subscribe(&agent_id).await;
    if socket.send(Message::Binary(snapshot.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(bytes) => {
                        if socket.send(Message::Binary(bytes.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Binary(bytes))) => {
                        if let Ok(remote) = serde_json::from_slice::<AgentDocument>(&bytes) {
                            state.rooms.merge_remote(&agent_id, remote).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

