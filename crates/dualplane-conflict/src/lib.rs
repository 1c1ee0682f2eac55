//! dualplane-conflict - Semantic claim divergence detection
//!
//! Maintains an index `(agentId, key) -> eventHash -> value`, generalized
//! from `dualplane-ledger`'s `by_hash` indexing idiom to a grouped,
//! two-level table. On each ingested `SemanticClaimUpserted`, groups the
//! index entries for that key by value; when two or more distinct values
//! are present it asks [`dualplane_voting::VotingCoordinator`] to open a
//! poll over the full candidate set, skipping the call if one is already
//! open for that key (the coordinator itself is the source of truth for
//! "already open," so no duplicate guard is kept here).

use std::collections::HashMap;
use std::sync::Arc;

use dualplane_types::{AgentId, EventHash, PollId};
use dualplane_voting::VotingCoordinator;
use tokio::sync::RwLock;

struct ConflictIndex {
    claims: HashMap<(AgentId, String), HashMap<EventHash, String>>,
}

impl ConflictIndex {
    fn new() -> Self {
        Self {
            claims: HashMap::new(),
        }
    }
}

/// Detects divergent semantic claims and escalates them to a poll.
#[derive(Clone)]
pub struct ConflictDetector {
    index: Arc<RwLock<ConflictIndex>>,
    voting: VotingCoordinator,
}

impl ConflictDetector {
    pub fn new(voting: VotingCoordinator) -> Self {
        Self {
            index: Arc::new(RwLock::new(ConflictIndex::new())),
            voting,
        }
    }

    /// Record one observed `SemanticClaimUpserted` and open a poll if its
    /// key now has ≥2 distinct values (steps 1-2). Returns the
    /// opened poll's id, or `None` if no divergence was found or a poll
    /// for this key is already open.
    pub async fn observe_claim( &self,
        agent_id: &AgentId,
        key: &str,
        event_hash: EventHash,
        value: String,
    ) -> Option<PollId> {
        let index_key = (agent_id.clone(), key.to_string());
        let candidates = {
            let mut index = self.index.write().await;
            let group = index.claims.entry(index_key).or_default();
            group.insert(event_hash, value);

            let mut by_value: HashMap<&String, usize> = HashMap::new();
            for value in group.values() {
                *by_value.entry(value).or_insert(0) += 1;
            }
            if by_value.len() < 2 {
                return None;
            }

            let mut candidates: Vec<EventHash> = group.keys().cloned().collect();
            candidates.sort();
            candidates
        };

        if self.voting.open_poll_for_key(agent_id, key).await.is_some() {
            return None;
        }

        match self
        .voting
        .start_poll(agent_id.clone(), key.to_string(), candidates)
        .await
        {
            Ok(poll_id) => {
                tracing::info!(%agent_id, key, %poll_id, "divergent claim escalated to poll");
                Some(poll_id)
            }
            Err(error) => {
                tracing::warn!(%agent_id, key, ?error, "failed to open poll for divergent claim");
                None
            }
        }
    }

    /// The candidate hashes currently indexed for `(agentId, key)`, for
    /// introspection and the projector's single-candidate fast path (spec
    /// §4.4, "Tie-break and single-candidate policy").
    pub async fn candidates_for(&self, agent_id: &AgentId, key: &str) -> Vec<EventHash> {
        let index = self.index.read().await;
        index
        .claims
        .get(&(agent_id.clone(), key.to_string()))
        .map(|group| group.keys().cloned().collect())
        .unwrap_or_default()
    }
}
