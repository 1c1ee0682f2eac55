//! The pluggable empirical resolver ("Alternate resolution path").
//!
//! A `GroundTruthResolver` may be consulted before a poll is opened; if it
//! returns a winner, the coordinator emits a `ResolutionEvent` with
//! `decidedBy: ground_truth_service` and never opens a poll. The core must
//! remain implementable without this path — the default `VotingCoordinator`
//! has `ground_truth: None` — so this is a trait object exactly like
//! `openibank-audit::AuditLog`'s `#[async_trait]` pattern, generalized from
//! a single concrete implementation to a pluggable seam.

use async_trait::async_trait;
use dualplane_types::{AgentId, EventHash};

/// An external oracle that may pick a winning claim for `(agentId, key)`
/// without a vote.
#[async_trait]
pub trait GroundTruthResolver: Send + Sync {
    /// Return the winning candidate hash, or `None` to fall through to a
    /// quorum poll.
    async fn resolve(&self, agent_id: &AgentId, key: &str, candidates: &[EventHash]) -> Option<EventHash>;
}

