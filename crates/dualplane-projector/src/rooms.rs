//! Per-room broadcast over CRDT documents (§4.7, §6.3).
//!
//! Grounded on `resonancex-ws::ConnectionState` and its per-channel
//! subscription bookkeeping, generalized from per-market channels keyed by
//! `Channel` to per-agent rooms keyed by `"agent:{agentId}"`, and from the
//! teacher's standalone `flume` broadcast pump to `tokio::sync::broadcast`
//! so the room lives on the same Tokio runtime as the rest of the
//! coordinator ("one HTTP stack instead of two" simplification).

use std::collections::HashMap;
use std::sync::Arc;

use dualplane_events::EventPayload;
use dualplane_types::{AgentId, EventHash};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use crate::document::AgentDocument;

/// The binary message shape exchanged over `/stream/{room}` :
/// a full snapshot on connect, then incremental updates thereafter. Both
/// variants carry the full document for simplicity — "incremental" here
/// means "the part of the document that changed triggered this message,"
/// not a byte-level diff (documented simplification, see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoomMessage {
    Snapshot(AgentDocument),
    Update(AgentDocument),
}

/// Default channel capacity for a room's broadcast sender. Lagging
/// subscribers drop old messages rather than block the projector; a
/// reconnect fetches a fresh snapshot.
pub const DEFAULT_ROOM_CAPACITY: usize = 256;

struct Room {
    document: RwLock<AgentDocument>,
    sender: broadcast::Sender<Vec<u8>>,
}

/// `room = "agent:{agentId}"` (§6.3).
pub fn room_name(agent_id: &AgentId) -> String {
    format!("agent:{agent_id}")
}

/// Lazily-created, per-room CRDT documents and broadcast channels (spec
/// §5, "per-room CRDT document mutations are serialized; cross-room work
/// is independent").
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Arc<Room>>>>,
    capacity: usize,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CAPACITY)
    }
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    async fn room(&self, name: &str) -> Arc<Room> {
        if let Some(room) = self.rooms.read().await.get(name) {
            return room.clone();
        }
        let mut rooms = self.rooms.write().await;
        rooms
        .entry(name.to_string())
        .or_insert_with(|| {
                let (sender, _) = broadcast::channel(self.capacity);
                Arc::new(Room {
                        document: RwLock::new(AgentDocument::new()),
                        sender,
                })
        })
        .clone()
    }

    /// Apply one ledger event to the named agent's document and, if it
    /// changed the document, fan the update out to all subscribers (spec
    /// §4.6, "Broadcast").
    pub async fn apply_event(&self, agent_id: &AgentId, payload: &EventPayload, event_hash: &EventHash) {
        let room = self.room(&room_name(agent_id)).await;
        let changed = {
            let mut document = room.document.write().await;
            document.apply(payload, event_hash)
        };
        if !changed {
            return;
        }
        let snapshot = room.document.read().await.clone();
        self.broadcast(&room, RoomMessage::Update(snapshot));
    }

    /// Subscribe to `agentId`'s room, returning an encoded full snapshot
    /// ("On connect: server sends one binary message containing
    /// the full CRDT snapshot") and a receiver for subsequent updates.
    pub async fn subscribe(&self, agent_id: &AgentId) -> (Vec<u8>, broadcast::Receiver<Vec<u8>>) {
        let room = self.room(&room_name(agent_id)).await;
        let document = room.document.read().await.clone();
        let snapshot = encode(&RoomMessage::Snapshot(document));
        (snapshot, room.sender.subscribe())
    }

    /// Merge a remote peer's document update into the room and rebroadcast
    /// ("Updates from subscribers... applied locally then
    /// re-broadcast to all other peers in the room").
    pub async fn merge_remote(&self, agent_id: &AgentId, remote: AgentDocument) {
        let room = self.room(&room_name(agent_id)).await;
        let changed = {
            let mut document = room.document.write().await;
            document.merge(&remote)
        };
        if !changed {
            return;
        }
        let snapshot = room.document.read().await.clone();
        self.broadcast(&room, RoomMessage::Update(snapshot));
    }

    fn broadcast(&self, room: &Room, message: RoomMessage) {
        let encoded = encode(&message);
        // No subscribers is not an error; the update is simply dropped.
        let _ = room.sender.send(encoded);
    }
}

fn encode(message: &RoomMessage) -> Vec<u8> {
    serde_json::to_vec(message).unwrap_or_default()
}
