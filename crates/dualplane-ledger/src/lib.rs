//! dualplane-ledger - The private, hash-chained ledger core
//!
//! Grounded on `openibank-ledger::Ledger`'s `Arc<RwLock<..>>` + append-only
//! `Vec` pattern, generalized from per-account balances to per-agent
//! transaction records indexed by both `EventHash` and `TxId`. A single
//! write-lock scope assigns `txId`, appends, and indexes together,
//! satisfying spec §5's rule that `commit` serializes `txId` assignment
//! and indexing under a single critical section.

pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dualplane_crypto::verify_message;
use dualplane_events::Event;
use dualplane_registry::Registry;
use dualplane_types::{AgentId, EventHash, InstanceId, TxId};
use tokio::sync::RwLock;

pub use error::{LedgerError, Result};

/// The smallest `limit` a caller may request from `tail`.
pub const MIN_TAIL_LIMIT: usize = 1;
/// The largest `limit` a caller may request from `tail`.
pub const MAX_TAIL_LIMIT: usize = 1000;
/// `tail`'s default `limit` when the caller does not specify one.
pub const DEFAULT_TAIL_LIMIT: usize = 100;

/// A ledger-assigned transaction record ("Transaction record").
#[derive(Debug, Clone, PartialEq)]
pub struct TxRecord {
    pub tx_id: TxId,
    pub accepted_at: DateTime<Utc>,
    pub agent_id: AgentId,
    pub instance_id: InstanceId,
    pub event_hash: EventHash,
    pub event: Event,
}

/// A fully-formed commit request (`commit`).
pub struct CommitRequest {
    pub agent_id: AgentId,
    pub instance_id: InstanceId,
    pub public_key_base64: String,
    pub event: Event,
    pub event_hash: EventHash,
    pub signature_base64: String,
}

struct LedgerInner {
    by_tx: Vec<TxRecord>,
    by_hash: HashMap<EventHash, usize>,
}

impl LedgerInner {
    fn new() -> Self {
        Self {
            by_tx: Vec::new(),
            by_hash: HashMap::new(),
        }
    }

    fn append( &mut self,
        agent_id: AgentId,
        instance_id: InstanceId,
        event: Event,
        event_hash: EventHash,
    ) -> TxRecord {
        let tx_id = self
        .by_tx
        .last()
        .map(|r| r.tx_id.next())
        .unwrap_or_else(TxId::first);
        let record = TxRecord {
            tx_id,
            accepted_at: Utc::now(),
            agent_id,
            instance_id,
            event_hash: event_hash.clone(),
            event,
        };
        self.by_hash.insert(event_hash, self.by_tx.len());
        self.by_tx.push(record.clone());
        record
    }
}

/// Query selector for [`Ledger::query`] (`query`).
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub tx_id: Option<TxId>,
    pub hash: Option<EventHash>,
}

/// The append-only private ledger (§4.2).
///
/// Holds an optional handle to the identity registry so `commit` can
/// reject a presented key that the registry has since superseded by a
/// rotation (spec §8, S3: "A commit signed by K1 → rejected (401)").
/// When no registry is attached, or the presenting instance has never
/// registered, `commit` falls back to verifying the signature against
/// whatever public key the caller supplied (spec §8, B1: "still accepted
/// if signature verifies... ledger does not require prior registration").
#[derive(Clone)]
pub struct Ledger {
    inner: Arc<RwLock<LedgerInner>>,
    registry: Option<Registry>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(LedgerInner::new())),
            registry: None,
        }
    }

    /// Build a ledger that cross-checks every `commit`'s presented public
    /// key against `registry`, so a superseded key is rejected after a
    /// rotation even though its signature still verifies on its own.
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LedgerInner::new())),
            registry: Some(registry),
        }
    }

    /// Accept a signed, client-proposed event (`commit`).
    ///
    /// Signature verification (CPU-bound) runs to completion before any
    /// lock is acquired, per the suspension-point rule in spec §5.
    /// Duplicate `eventHash`es are idempotent: the existing record is
    /// returned rather than appending again ("Transaction record"
    /// invariant).
    pub async fn commit(&self, request: CommitRequest) -> Result<TxRecord> {
        let computed_hash = request
        .event
        .hash()
        .map_err(|_| LedgerError::EventHashMismatch)?;
        if computed_hash != request.event_hash {
            return Err(LedgerError::EventHashMismatch);
        }

        verify_message( &request.public_key_base64,
            request.event_hash.as_str(),
            &request.signature_base64,
        )
        .map_err(|_| LedgerError::InvalidSignature)?;

        if let Some(registry) = &self.registry {
            if let Some(registered_key) = registry
            .lookup_key(&request.agent_id, &request.instance_id)
            .await
            {
                if registered_key != request.public_key_base64 {
                    return Err(LedgerError::InvalidSignature);
                }
            }
        }

        let mut inner = self.inner.write().await;
        if let Some(&idx) = inner.by_hash.get(&request.event_hash) {
            return Ok(inner.by_tx[idx].clone());
        }
        let record = inner.append( request.agent_id,
            request.instance_id,
            request.event,
            request.event_hash,
        );
        tracing::info!(tx_id = %record.tx_id, agent_id = %record.agent_id, "event committed");
        Ok(record)
    }

    /// Append a coordinator-synthesized event (`KeyRotated`,
    /// `ResolutionEvent`) without requiring an instance signature — these
    /// are authoritative products of the registry and voting coordinator,
    /// not instance proposals, mirroring how `ResolutionEvent`
    /// is "emit[ted]... into the ledger" directly by the coordinator.
    /// Idempotent on `eventHash` exactly like [`Ledger::commit`].
    pub async fn commit_internal( &self,
        agent_id: AgentId,
        instance_id: InstanceId,
        event: Event,
    ) -> Result<TxRecord> {
        let event_hash = event.hash().map_err(|_| LedgerError::EventHashMismatch)?;
        let mut inner = self.inner.write().await;
        if let Some(&idx) = inner.by_hash.get(&event_hash) {
            return Ok(inner.by_tx[idx].clone());
        }
        let record = inner.append(agent_id, instance_id, event, event_hash);
        tracing::info!(tx_id = %record.tx_id, agent_id = %record.agent_id, "system event committed");
        Ok(record)
    }

    /// O(1) lookup by either `txId` or `hash` (`query`).
    pub async fn query(&self, query: Query) -> Option<TxRecord> {
        let inner = self.inner.read().await;
        if let Some(hash) = query.hash {
            return inner.by_hash.get(&hash).map(|&idx| inner.by_tx[idx].clone());
        }
        if let Some(tx_id) = query.tx_id {
            return inner.by_tx.iter().find(|r| r.tx_id == tx_id).cloned();
        }
        None
    }

    /// Contiguous slice of the ordered stream after `after_tx_id` (spec
    /// §4.2, `tail`). `limit` is clamped to `[1, 1000]` by the caller
    /// ; out-of-range input here is clamped defensively too.
    pub async fn tail(&self, after_tx_id: Option<TxId>, limit: usize) -> Vec<TxRecord> {
        let limit = limit.clamp(MIN_TAIL_LIMIT, MAX_TAIL_LIMIT);
        let inner = self.inner.read().await;
        let start = match after_tx_id {
            None => 0,
            Some(tx_id) => inner
            .by_tx
            .iter()
            .position(|r| r.tx_id == tx_id)
            .map(|idx| idx + 1)
            .unwrap_or(inner.by_tx.len()),
        };
        inner.by_tx.iter().skip(start).take(limit).cloned().collect()
    }

    /// Total number of records committed so far.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_tx.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualplane_crypto::{sign_message, Keypair};
    use dualplane_events::{EventPayload, SemanticClaimUpserted};
    use dualplane_types::EventId;

    fn claim_event(agent: &AgentId, key: &str, value: &str) -> Event {
        Event::new( agent.clone(),
            EventId::generate(),
            EventPayload::SemanticClaimUpserted(SemanticClaimUpserted {
                    key: key.to_string(),
                    value: value.to_string(),
                    confidence: 0.9,
                    provenance: "instance-A".to_string(),
            }),
            Utc::now(),
            None,
        )
    }

    fn signed_request(agent: &AgentId, instance: &InstanceId, kp: &Keypair, event: Event) -> CommitRequest {
        let event_hash = event.hash().unwrap();
        let signature = sign_message(kp, event_hash.as_str());
        CommitRequest {
            agent_id: agent.clone(),
            instance_id: instance.clone(),
            public_key_base64: kp.public_key_base64(),
            event,
            event_hash,
            signature_base64: signature,
        }
    }

    #[tokio::test]
    async fn commit_then_query_by_hash_round_trips() {
        let ledger = Ledger::new();
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp = Keypair::generate();
        let request = signed_request(&agent, &instance, &kp, claim_event(&agent, "ceo", "X"));
        let hash = request.event_hash.clone();

        let record = ledger.commit(request).await.unwrap();
        assert_eq!(record.tx_id, TxId::first());

        let found = ledger
        .query(Query { tx_id: None, hash: Some(hash) })
        .await
        .unwrap();
        assert_eq!(found.event_hash, record.event_hash);
    }

    #[tokio::test]
    async fn commit_rejects_tampered_signature() {
        let ledger = Ledger::new();
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp = Keypair::generate();
        let mut request = signed_request(&agent, &instance, &kp, claim_event(&agent, "ceo", "X"));
        request.signature_base64 = sign_message(&Keypair::generate(), request.event_hash.as_str());

        let result = ledger.commit(request).await;
        assert!(matches!(result, Err(LedgerError::InvalidSignature)));
    }

    #[tokio::test]
    async fn commit_is_idempotent_on_duplicate_hash() {
        let ledger = Ledger::new();
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp = Keypair::generate();
        let event = claim_event(&agent, "ceo", "X");

        let first = ledger
        .commit(signed_request(&agent, &instance, &kp, event.clone()))
        .await
        .unwrap();
        let second = ledger
        .commit(signed_request(&agent, &instance, &kp, event))
        .await
        .unwrap();

        assert_eq!(first.tx_id, second.tx_id);
        assert_eq!(first.accepted_at, second.accepted_at);
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn tail_pages_are_contiguous_and_stable() {
        let ledger = Ledger::new();
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp = Keypair::generate();

        for i in 0..100 {
            let event = claim_event(&agent, &format!("key{i}"), "v");
            ledger
            .commit(signed_request(&agent, &instance, &kp, event))
            .await
            .unwrap();
        }

        let first_page = ledger.tail(None, 50).await;
        assert_eq!(first_page.len(), 50);
        assert_eq!(first_page[0].tx_id, TxId(1));
        assert_eq!(first_page[49].tx_id, TxId(50));

        let second_page = ledger.tail(Some(TxId(50)), 50).await;
        assert_eq!(second_page.len(), 50);
        assert_eq!(second_page[0].tx_id, TxId(51));

        let empty = ledger.tail(Some(TxId(100)), 50).await;
        assert!(empty.is_empty());

        let repeat = ledger.tail(None, 50).await;
        assert_eq!(repeat, first_page);
    }

    #[tokio::test]
    async fn tail_beyond_any_issued_tx_id_returns_empty() {
        let ledger = Ledger::new();
        let out = ledger.tail(Some(TxId(9999)), 10).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn commit_internal_bypasses_signature_check() {
        let ledger = Ledger::new();
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("system");
        let event = claim_event(&agent, "ceo", "X");
        let record = ledger
        .commit_internal(agent, instance, event)
        .await
        .unwrap();
        assert_eq!(record.tx_id, TxId::first());
    }

    #[tokio::test]
    async fn unregistered_instance_is_still_accepted_on_signature_alone() {
        let registry = Registry::new();
        let ledger = Ledger::with_registry(registry);
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp = Keypair::generate();
        let request = signed_request(&agent, &instance, &kp, claim_event(&agent, "ceo", "X"));

        let result = ledger.commit(request).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn commit_under_a_superseded_key_is_rejected_after_rotation() {
        let registry = Registry::new();
        let ledger = Ledger::with_registry(registry.clone());
        let agent = AgentId::new("agent1");
        let instance = InstanceId::new("A");
        let kp_old = Keypair::generate();
        let kp_new = Keypair::generate();

        let ts = "2026-01-01T00:00:00Z";
        let register_sig = sign_message(&kp_old, &format!("{agent}:{instance}:{ts}"));
        registry
        .register(agent.clone(), instance.clone(), kp_old.public_key_base64(), ts, &register_sig)
        .await
        .unwrap();

        let rotate_sig = sign_message(&kp_old, &format!("{agent}:{instance}:keyrotate:{}", kp_new.public_key_base64()));
        registry
        .rotate_key(agent.clone(), instance.clone(), kp_new.public_key_base64(), &rotate_sig)
        .await
        .unwrap();

        let stale_request =
        signed_request(&agent, &instance, &kp_old, claim_event(&agent, "ceo", "X"));
        let result = ledger.commit(stale_request).await;
        assert!(matches!(result, Err(LedgerError::InvalidSignature)));

        let fresh_request =
        signed_request(&agent, &instance, &kp_new, claim_event(&agent, "ceo", "X"));
        assert!(ledger.commit(fresh_request).await.is_ok());
    }
}

