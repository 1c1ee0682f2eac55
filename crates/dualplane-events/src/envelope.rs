//! The event envelope ("Event") and its hash chain.
//!
//! Grounded on `openibank-core::commitment::CommitmentReceipt`'s split
//! between a signable body and the hash/signature computed over it:
//! [`Event::canonical_bytes`] is the signable body, [`Event::hash`] is the
//! commit-time digest, and [`Event::prev`] is the advisory causal pointer
//! describes ("Validation is advisory — ledger does not reject
//! events with missing or mismatched `prev`").

use chrono::{DateTime, Utc};
use dualplane_crypto::{canonical_json_bytes, hash_object};
use dualplane_types::{AgentId, EventHash, EventId};
use serde::{Deserialize, Serialize};

use crate::payload::{EventPayload, Primitive};

/// An immutable, hash-chainable record proposed by one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub agent_id: AgentId,
    pub event_id: EventId,
    pub primitive: Primitive,
    pub created_at: DateTime<Utc>,
    pub payload: EventPayload,
    /// Hash of the prior event in the instance's local chain, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<EventHash>,
}

impl Event {
    /// Build an event, deriving `primitive` from `payload` where the
    /// payload is one of the closed set (event -> primitive
    /// table); unrecognized payloads fall back to `semantic_memory` so the
    /// event can still round-trip through the ledger.
    pub fn new( agent_id: AgentId,
        event_id: EventId,
        payload: EventPayload,
        created_at: DateTime<Utc>,
        prev: Option<EventHash>,
    ) -> Self {
        let primitive = payload.primitive().unwrap_or(Primitive::SemanticMemory);
        Self {
            agent_id,
            event_id,
            primitive,
            created_at,
            payload,
            prev,
        }
    }

    /// The canonical (stable-key-order) JSON bytes of this event (spec
    /// §6.2: "The canonical form is `JSON.stringify` with stable key
    /// order").
    pub fn canonical_bytes(&self) -> dualplane_crypto::Result<Vec<u8>> {
        canonical_json_bytes(self)
    }

    /// `eventHash = SHA-384(canonical(event))`.
    pub fn hash(&self) -> dualplane_crypto::Result<EventHash> {
        Ok(EventHash::new(hash_object(self)?))
    }
}
