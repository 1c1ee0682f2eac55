//! dualplane-voting - Quorum voting coordinator for semantic-claim
//! resolution
//!
//! Grounded on the same `Arc<RwLock<..>>`-guarded table idiom as
//! `dualplane-ledger` and `dualplane-registry`, generalized to a poll
//! table keyed by `PollId` plus a `(AgentId, key) -> PollId` index for the
//! conflict detector's "one open poll per key" rule.
//! Finalization emits a `ResolutionEvent` directly into the ledger via
//! [`dualplane_ledger::Ledger::commit_internal`], mirroring how the ledger
//! itself documents that event as coordinator-authoritative rather than
//! instance-signed.

pub mod error;
pub mod ground_truth;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dualplane_crypto::verify_message;
use dualplane_events::{DecidedBy, Event, EventPayload, PollSummary, ResolutionEvent as ResolutionPayload};
use dualplane_ledger::Ledger;
use dualplane_registry::Registry;
use dualplane_types::{AgentId, EventHash, EventId, InstanceId, PollId};
use tokio::sync::RwLock;

pub use error::{Result, VotingError};
pub use ground_truth::GroundTruthResolver;

/// The instance id coordinator-synthesized events are recorded under,
/// since they have no single instance author (`ResolutionEvent`).
pub const SYSTEM_INSTANCE: &str = "system";

/// Lifecycle state of a poll ("Poll" lifecycle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Open,
    Decided,
}

/// A semantic-claim resolution poll ("Poll").
#[derive(Debug, Clone)]
pub struct Poll {
    pub poll_id: PollId,
    pub agent_id: AgentId,
    pub key: String,
    pub candidates: Vec<EventHash>,
    pub quorum_required: usize,
    pub votes: HashMap<InstanceId, EventHash>,
    pub winner_claim_hash: Option<EventHash>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<DecidedBy>,
}

impl Poll {
    pub fn state(&self) -> PollState {
        if self.winner_claim_hash.is_some() {
            PollState::Decided
        } else {
            PollState::Open
        }
    }
}

/// `ceil(n * 0.5)` ("Quorum"). `n = 0` is handled by the caller
/// ((c): "N=0 yields quorum=0... implementations must treat N=0 as
/// 'cannot resolve' and refuse to open polls").
fn quorum_required(n: usize) -> usize {
    n.div_ceil(2)
}

/// Coordinates polls for one ledger/registry pair.
#[derive(Clone)]
pub struct VotingCoordinator {
    polls: Arc<RwLock<HashMap<PollId, Poll>>>,
    open_by_key: Arc<RwLock<HashMap<(AgentId, String), PollId>>>,
    registry: Registry,
    ledger: Ledger,
    ground_truth: Option<Arc<dyn GroundTruthResolver>>,
}

impl VotingCoordinator {
    pub fn new(registry: Registry, ledger: Ledger) -> Self {
        Self {
            polls: Arc::new(RwLock::new(HashMap::new())),
            open_by_key: Arc::new(RwLock::new(HashMap::new())),
            registry,
            ledger,
            ground_truth: None,
        }
    }

    /// Attach the pluggable empirical resolver ("Alternate
    /// resolution path"). Optional; the core works without it.
    pub fn with_ground_truth(mut self, resolver: Arc<dyn GroundTruthResolver>) -> Self {
        self.ground_truth = Some(resolver);
        self
    }

    /// The poll currently open for `(agentId, key)`, if any.
    pub async fn open_poll_for_key(&self, agent_id: &AgentId, key: &str) -> Option<PollId> {
        self.open_by_key
        .read()
        .await
        .get(&(agent_id.clone(), key.to_string()))
        .cloned()
    }

    /// Open a poll over `candidates` for `(agentId, key)` (spec §4.5,
    /// `startPoll`). If a [`GroundTruthResolver`] is attached and resolves
    /// a winner, the poll is created already decided via
    /// `decidedBy: ground_truth_service` and no vote is ever accepted.
    pub async fn start_poll( &self,
        agent_id: AgentId,
        key: String,
        candidates: Vec<EventHash>,
    ) -> Result<PollId> {
        if candidates.len() < 2 {
            return Err(VotingError::InsufficientCandidates);
        }

        let n = self.registry.registered_instance_count(&agent_id).await;
        if n == 0 {
            return Err(VotingError::NoRegisteredInstances {
                    agent_id: agent_id.to_string(),
            });
        }
        let quorum = quorum_required(n);

        let poll_id = PollId::generate();
        let mut poll = Poll {
            poll_id: poll_id.clone(),
            agent_id: agent_id.clone(),
            key: key.clone(),
            candidates: candidates.clone(),
            quorum_required: quorum,
            votes: HashMap::new(),
            winner_claim_hash: None,
            decided_at: None,
            decided_by: None,
        };

        if let Some(resolver) = &self.ground_truth {
            if let Some(winner) = resolver.resolve(&agent_id, &key, &candidates).await {
                self.finalize(&mut poll, winner, DecidedBy::GroundTruthService).await;
                self.polls.write().await.insert(poll_id.clone(), poll);
                tracing::info!(%agent_id, key, "poll resolved by ground truth service");
                return Ok(poll_id);
            }
        }

        self.polls.write().await.insert(poll_id.clone(), poll);
        self.open_by_key
        .write()
        .await
        .insert((agent_id.clone(), key.clone()), poll_id.clone());
        tracing::info!(%agent_id, key, %poll_id, quorum, "poll opened");
        Ok(poll_id)
    }

    /// Record a signed vote and finalize the poll if quorum is now met
    /// (`vote`). Votes after a decision are no-ops (I5).
    pub async fn vote( &self,
        poll_id: &PollId,
        agent_id: &AgentId,
        instance_id: InstanceId,
        claim_hash: EventHash,
        public_key_base64: &str,
        signature_base64: &str,
    ) -> Result<Poll> {
        let mut polls = self.polls.write().await;
        let poll = polls
        .get_mut(poll_id)
        .ok_or_else(|| VotingError::PollNotFound {
                poll_id: poll_id.to_string(),
        })?;

        if poll.state() == PollState::Decided {
            return Ok(poll.clone());
        }
        if &poll.agent_id != agent_id {
            return Err(VotingError::AgentMismatch);
        }
        if !poll.candidates.contains(&claim_hash) {
            return Err(VotingError::CandidateMismatch);
        }

        let registered_key = self
        .registry
        .lookup_key(agent_id, &instance_id)
        .await
        .ok_or_else(|| VotingError::InstanceNotRegistered {
                agent_id: agent_id.to_string(),
                instance_id: instance_id.to_string(),
        })?;
        if registered_key != public_key_base64 {
            return Err(VotingError::KeyMismatch);
        }

        let message = format!("{}:{}", poll_id, claim_hash);
        verify_message(public_key_base64, &message, signature_base64)
        .map_err(|_| VotingError::InvalidSignature)?;

        poll.votes.insert(instance_id, claim_hash);

        if poll.votes.len() >= poll.quorum_required {
            let winner = tally_winner(&poll.votes);
            self.finalize(poll, winner, DecidedBy::Poll).await;
            self.open_by_key
            .write()
            .await
            .remove(&(poll.agent_id.clone(), poll.key.clone()));
        }

        Ok(poll.clone())
    }

    /// Current poll state (`status`).
    pub async fn status(&self, poll_id: &PollId) -> Option<Poll> {
        self.polls.read().await.get(poll_id).cloned()
    }

    /// Mark `poll` decided with `winner`, appending a `ResolutionEvent`
    /// into the ledger (finalization algorithm).
    async fn finalize(&self, poll: &mut Poll, winner: EventHash, decided_by: DecidedBy) {
        let now = Utc::now();
        let suppressed: Vec<EventHash> = poll
        .candidates
        .iter()
        .filter(|c| **c != winner)
        .cloned()
        .collect();

        poll.winner_claim_hash = Some(winner.clone());
        poll.decided_at = Some(now);
        poll.decided_by = Some(decided_by);

        let poll_summary = match decided_by {
            DecidedBy::Poll => Some(PollSummary {
                    quorum_required: poll.quorum_required,
                    quorum_reached: poll.votes.len(),
                    votes: poll
                    .votes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }),
            DecidedBy::GroundTruthService => None,
        };

        let event = Event::new( poll.agent_id.clone(),
            EventId::generate(),
            EventPayload::ResolutionEvent(ResolutionPayload {
                    key: poll.key.clone(),
                    winner_claim_hash: winner.clone(),
                    suppressed_claim_hashes: suppressed,
                    decided_by,
                    poll: poll_summary,
            }),
            now,
            None,
        );

        if let Err(error) = self
        .ledger
        .commit_internal( poll.agent_id.clone(),
            InstanceId::new(SYSTEM_INSTANCE),
            event,
        )
        .await
        {
            tracing::error!(?error, agent_id = %poll.agent_id, key = %poll.key, "failed to append resolution event");
        }

        tracing::info!(agent_id = %poll.agent_id, key = %poll.key, winner = %winner, "poll decided");
    }
}

/// Tally votes by candidate, breaking ties by ascending hash (spec §4.5's
/// finalization algorithm: "sort descending by count, ascending by hash
/// for ties").
fn tally_winner(votes: &HashMap<InstanceId, EventHash>) -> EventHash {
    let mut counts: HashMap<&EventHash, usize> = HashMap::new();
    for hash in votes.values() {
        *counts.entry(hash).or_insert(0) += 1;
    }
    let mut tallied: Vec<(&EventHash, usize)> = counts.into_iter().collect();
    tallied.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    tallied[0].0.clone()
}
