//! The tailing ingest pipeline (§9).
//!
//! Polls `Ledger::tail` on an interval and, for each record in order, runs
//! it through one pipeline stage per re-architecture note:
//! index (conflict detector) -> detect (open a poll on divergence) ->
//! project (CRDT apply) -> broadcast. This replaces the ad-hoc callback
//! chains the teacher's market-data pipeline used between ingestion and
//! fan-out with a single linear function over one record at a time.

use std::time::Duration;

use dualplane_conflict::ConflictDetector;
use dualplane_events::EventPayload;
use dualplane_ledger::Ledger;
use dualplane_types::TxId;
use tokio::sync::RwLock;
use tokio::time::interval;

use crate::rooms::RoomRegistry;

/// How often the projector polls the ledger for new records, and how many
/// records it requests per poll ("projector tail interval and
/// batch size" config knobs).
#[derive(Debug, Clone, Copy)]
pub struct IngestConfig {
    pub poll_interval: Duration,
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
            batch_size: 100,
        }
    }
}

/// Drives the tailing pipeline against one ledger, updating `rooms` and
/// escalating divergent semantic claims via `conflict`.
pub struct Projector {
    ledger: Ledger,
    conflict: ConflictDetector,
    rooms: RoomRegistry,
    last_seen: RwLock<Option<TxId>>,
    config: IngestConfig,
}

impl Projector {
    pub fn new(ledger: Ledger, conflict: ConflictDetector, rooms: RoomRegistry, config: IngestConfig) -> Self {
        Self {
            ledger,
            conflict,
            rooms,
            last_seen: RwLock::new(None),
            config,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Run the polling loop until cancelled. Intended to be spawned as a
    /// background task by the service binary.
    pub async fn run(&self) {
        let mut ticker = interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// Drain everything currently available after `lastSeenTxId`, advancing
    /// it as records are processed. Exposed separately from `run` so tests
    /// (and a future admin endpoint) can drive one step deterministically.
    pub async fn poll_once(&self) {
        loop {
            let after = *self.last_seen.read().await;
            let batch = self.ledger.tail(after, self.config.batch_size).await;
            if batch.is_empty() {
                return;
            }
            let full_batch = batch.len() == self.config.batch_size;
            for record in &batch {
                self.apply_record(&record.agent_id, &record.event_hash, &record.event.payload)
                .await;
                *self.last_seen.write().await = Some(record.tx_id);
            }
            if !full_batch {
                return;
            }
        }
    }

    async fn apply_record( &self,
        agent_id: &dualplane_types::AgentId,
        event_hash: &dualplane_types::EventHash,
        payload: &EventPayload,
    ) {
        if let EventPayload::SemanticClaimUpserted(claim) = payload {
            self.conflict
            .observe_claim(agent_id, &claim.key, event_hash.clone(), claim.value.clone())
            .await;
        }
        self.rooms.apply_event(agent_id, payload, event_hash).await;
    }
}
