//! dualplane-registry - Instance/agent identity registry
//!
//! Binds `(agentId, instanceId)` to the instance's current Ed25519 public
//! key, and accepts signed rotation proofs. Grounded on
//! `openibank-audit::AuditLog`'s append/verify shape, generalized from an
//! immutable hash-chained log to a keyed binding table guarded by one
//! `RwLock`.

pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dualplane_crypto::verify_message;
use dualplane_events::{Event, EventPayload, KeyRotated as KeyRotatedPayload};
use dualplane_types::{AgentId, EventId, InstanceId};
use tokio::sync::RwLock;

pub use error::{RegistryError, Result};

/// A registered instance's current key material and bookkeeping.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub public_key_base64: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Outcome of a successful `register` call.
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub registered_at: DateTime<Utc>,
}

/// The identity registry: `(agentId, instanceId) -> RegistryEntry` (spec
/// §3, "Instance" invariant: exactly one current public key at a time).
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<HashMap<(AgentId, InstanceId), RegistryEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify `signature` over `SHA-384("{agentId}:{instanceId}:{ts}")`
    /// under `public_key`, then bind or refresh the instance's key (spec
    /// §4.1, `register`).
    pub async fn register( &self,
        agent_id: AgentId,
        instance_id: InstanceId,
        public_key_base64: String,
        ts: &str,
        signature_base64: &str,
    ) -> Result<RegisterOutcome> {
        let message = format!("{}:{}:{}", agent_id, instance_id, ts);
        verify_message(&public_key_base64, &message, signature_base64)
        .map_err(|_| RegistryError::InvalidSignature)?;

        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let key = (agent_id.clone(), instance_id.clone());
        let registered_at = match entries.get_mut(&key) {
            Some(existing) if existing.public_key_base64 == public_key_base64 => {
                existing.last_seen_at = now;
                existing.registered_at
            }
            _ => {
                entries.insert( key,
                    RegistryEntry {
                        public_key_base64,
                        registered_at: now,
                        last_seen_at: now,
                    },
                );
                now
            }
        };

        tracing::info!(%agent_id, %instance_id, "instance registered");
        Ok(RegisterOutcome { registered_at })
    }

    /// Current public key for `(agentId, instanceId)`, if registered (spec
    /// §4.1, `lookupKey`).
    pub async fn lookup_key(&self, agent_id: &AgentId, instance_id: &InstanceId) -> Option<String> {
        let entries = self.entries.read().await;
        entries
        .get(&(agent_id.clone(), instance_id.clone()))
        .map(|e| e.public_key_base64.clone())
    }

    /// Count of instances registered for `agentId` (quorum input).
    pub async fn registered_instance_count(&self, agent_id: &AgentId) -> usize {
        let entries = self.entries.read().await;
        entries.keys().filter(|(a, _)| a == agent_id).count()
    }

    /// Rotate an instance's key, requiring a signature under the
    /// **current** key (`rotateKey`). Returns an unsigned
    /// `KeyRotated` event for the caller to append to the ledger (the
    /// registry has no ledger dependency, mirroring the teacher's
    /// `AuditLog` producing entries a caller persists).
    pub async fn rotate_key( &self,
        agent_id: AgentId,
        instance_id: InstanceId,
        new_public_key_base64: String,
        signature_base64: &str,
    ) -> Result<Event> {
        let mut entries = self.entries.write().await;
        let key = (agent_id.clone(), instance_id.clone());
        let entry = entries
        .get_mut(&key)
        .ok_or_else(|| RegistryError::InstanceNotRegistered {
                agent_id: agent_id.to_string(),
                instance_id: instance_id.to_string(),
        })?;

        let message = format!( "{}:{}:keyrotate:{}",
            agent_id, instance_id, new_public_key_base64
        );
        verify_message(&entry.public_key_base64, &message, signature_base64)
        .map_err(|_| RegistryError::InvalidSignature)?;

        let now = Utc::now();
        entry.public_key_base64 = new_public_key_base64.clone();
        entry.last_seen_at = now;

        tracing::info!(%agent_id, %instance_id, "instance key rotated");

        Ok(Event::new( agent_id,
                EventId::generate(),
                EventPayload::KeyRotated(KeyRotatedPayload {
                        instance_id: instance_id.to_string(),
                        new_public_key_base64,
                }),
                now,
                None,
        ))
    }
}
