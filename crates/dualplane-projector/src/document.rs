//! The per-agent CRDT read model ("Public CRDT document"; §4.6).
//!
//! Grounded on `resonancex-ws`'s per-channel data structs (`TickerData`,
//! `DepthData`, ...), generalized from one struct per market-data kind to
//! one document per agent holding all five named structures. `apply`
//! implements transform table directly; every arm is written
//! to be idempotent so replaying a ledger prefix twice converges to the
//! same state ("Convergence invariant").

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use dualplane_events::{EventPayload, ResolutionEvent};
use dualplane_types::EventHash;
use serde::{Deserialize, Serialize};

/// The currently-public winner for a semantic key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicClaim {
    pub claim_hash: EventHash,
    pub resolved_at: DateTime<Utc>,
}

/// Lifecycle state of a skill entry (`SkillAdded`/`SkillDeprecated`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Active,
    Deprecated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub status: SkillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The CRDT-converging read model for one agent ("Public CRDT document").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDocument {
    pub public_claims: HashMap<String, PublicClaim>,
    pub semantic_candidates: HashMap<String, Vec<EventHash>>,
    pub suppression_set: HashSet<EventHash>,
    pub skills: HashMap<String, Skill>,
    pub agent_profile: BTreeMap<String, String>,
}

impl AgentDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one ledger-ordered event (transform table).
    /// `event_hash` is the ledger-assigned hash of the event carrying
    /// `payload` — needed for `SemanticClaimUpserted`, which does not
    /// carry its own hash. Returns whether the document changed, so the
    /// caller knows whether a broadcast is warranted.
    pub fn apply(&mut self, payload: &EventPayload, event_hash: &EventHash) -> bool {
        match payload {
            EventPayload::SemanticClaimUpserted(claim) => {
                self.apply_semantic_claim(&claim.key, event_hash.clone())
            }
            EventPayload::ResolutionEvent(resolution) => self.apply_resolution(resolution),
            EventPayload::SkillAdded(skill) => {
                self.skills.insert( skill.name.clone(),
                    Skill {
                        status: SkillStatus::Active,
                        description: Some(skill.description.clone()),
                        confidence: Some(skill.confidence),
                        source: skill.source.clone(),
                        reason: None,
                        updated_at: Utc::now(),
                    },
                );
                true
            }
            EventPayload::SkillDeprecated(skill) => {
                let entry = self.skills.entry(skill.name.clone()).or_insert_with(|| Skill {
                        status: SkillStatus::Deprecated,
                        description: None,
                        confidence: None,
                        source: None,
                        reason: None,
                        updated_at: Utc::now(),
                });
                entry.status = SkillStatus::Deprecated;
                entry.reason = skill.reason.clone();
                entry.updated_at = Utc::now();
                true
            }
            EventPayload::PersonaUpdated(persona) => {
                if persona.fields.is_empty() {
                    return false;
                }
                for (field, value) in &persona.fields {
                    self.agent_profile.insert(field.clone(), value.clone());
                }
                true
            }
            EventPayload::RightGranted(_)
            | EventPayload::RightRevoked(_)
            | EventPayload::KeyRotated(_)
            | EventPayload::EpisodicMemoryAdded(_)
            | EventPayload::Other { .. } => false,
        }
    }

    /// Add `event_hash` to `semanticCandidates[key]`; if it is the only
    /// candidate, also fix it as the current `publicClaims[key]` (spec
    /// §4.6's first table row). Idempotent: re-applying the same hash is
    /// a no-op.
    fn apply_semantic_claim(&mut self, key: &str, event_hash: EventHash) -> bool {
        let candidates = self.semantic_candidates.entry(key.to_string()).or_default();
        if candidates.contains(&event_hash) {
            return false;
        }
        candidates.push(event_hash.clone());
        if candidates.len() == 1 {
            self.public_claims.insert( key.to_string(),
                PublicClaim {
                    claim_hash: event_hash,
                    resolved_at: Utc::now(),
                },
            );
        }
        true
    }

    fn apply_resolution(&mut self, resolution: &ResolutionEvent) -> bool {
        let already_public = self
        .public_claims
        .get(&resolution.key)
        .map(|c| c.claim_hash == resolution.winner_claim_hash)
        .unwrap_or(false);

        if !already_public {
            self.public_claims.insert( resolution.key.clone(),
                PublicClaim {
                    claim_hash: resolution.winner_claim_hash.clone(),
                    resolved_at: Utc::now(),
                },
            );
        }

        let candidates = self
        .semantic_candidates
        .entry(resolution.key.clone())
        .or_default();
        let mut ordered = vec![resolution.winner_claim_hash.clone()];
        ordered.extend(resolution.suppressed_claim_hashes.iter().cloned());
        if *candidates != ordered {
            *candidates = ordered;
        }

        let mut changed = !already_public;
        for hash in &resolution.suppressed_claim_hashes {
            if self.suppression_set.insert(hash.clone()) {
                changed = true;
            }
        }
        changed
    }

    /// Merge a remote peer's document into this one ("Updates
    /// from subscribers... applied locally then re-broadcast"). Each field
    /// merges by its own CRDT rule: `semanticCandidates`/`suppressionSet`
    /// are grow-only sets (union), `publicClaims`/`skills` are
    /// last-writer-wins registers keyed by their own timestamp,
    /// `agentProfile` is a last-writer-wins map with no per-field
    /// timestamp, so the remote value wins ties (documented simplification
    /// in DESIGN.md). Returns whether the merge changed local state.
    pub fn merge(&mut self, other: &AgentDocument) -> bool {
        let mut changed = false;

        for (key, candidate) in &other.public_claims {
            match self.public_claims.get(key) {
                Some(existing) if existing.resolved_at >= candidate.resolved_at => {}
                _ => {
                    self.public_claims.insert(key.clone(), candidate.clone());
                    changed = true;
                }
            }
        }

        for (key, hashes) in &other.semantic_candidates {
            let local = self.semantic_candidates.entry(key.clone()).or_default();
            for hash in hashes {
                if !local.contains(hash) {
                    local.push(hash.clone());
                    changed = true;
                }
            }
        }

        for hash in &other.suppression_set {
            if self.suppression_set.insert(hash.clone()) {
                changed = true;
            }
        }

        for (name, skill) in &other.skills {
            match self.skills.get(name) {
                Some(existing) if existing.updated_at >= skill.updated_at => {}
                _ => {
                    self.skills.insert(name.clone(), skill.clone());
                    changed = true;
                }
            }
        }

        for (field, value) in &other.agent_profile {
            if self.agent_profile.get(field) != Some(value) {
                self.agent_profile.insert(field.clone(), value.clone());
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualplane_events::{DecidedBy, PersonaUpdated, SkillAdded, SkillDeprecated};

    #[test]
    fn single_candidate_becomes_public_claim() {
        let mut doc = AgentDocument::new();
        let changed = doc.apply_semantic_claim("ceo", EventHash::new("h1"));
        assert!(changed);
        assert_eq!(doc.public_claims["ceo"].claim_hash, EventHash::new("h1"));
        assert_eq!(doc.semantic_candidates["ceo"], vec![EventHash::new("h1")]);
    }

    #[test]
    fn second_candidate_does_not_overwrite_public_claim() {
        let mut doc = AgentDocument::new();
        doc.apply_semantic_claim("ceo", EventHash::new("h1"));
        doc.apply_semantic_claim("ceo", EventHash::new("h2"));
        assert_eq!(doc.public_claims["ceo"].claim_hash, EventHash::new("h1"));
        assert_eq!(doc.semantic_candidates["ceo"].len(), 2);
    }

    #[test]
    fn resolution_event_sets_winner_and_suppresses_losers() {
        let mut doc = AgentDocument::new();
        doc.apply_semantic_claim("ceo", EventHash::new("h1"));
        doc.apply_semantic_claim("ceo", EventHash::new("h2"));

        let resolution = ResolutionEvent {
            key: "ceo".to_string(),
            winner_claim_hash: EventHash::new("h2"),
            suppressed_claim_hashes: vec![EventHash::new("h1")],
            decided_by: DecidedBy::Poll,
            poll: None,
        };
        let changed = doc.apply_resolution(&resolution);
        assert!(changed);
        assert_eq!(doc.public_claims["ceo"].claim_hash, EventHash::new("h2"));
        assert_eq!( doc.semantic_candidates["ceo"],
            vec![EventHash::new("h2"), EventHash::new("h1")]
        );
        assert!(doc.suppression_set.contains(&EventHash::new("h1")));
    }

    #[test]
    fn replaying_the_same_prefix_twice_converges() {
        let mut once = AgentDocument::new();
        once.apply_semantic_claim("ceo", EventHash::new("h1"));
        once.apply_semantic_claim("ceo", EventHash::new("h2"));

        let mut twice = once.clone();
        let changed = twice.apply_semantic_claim("ceo", EventHash::new("h1"));
        assert!(!changed);
        let changed = twice.apply_semantic_claim("ceo", EventHash::new("h2"));
        assert!(!changed);
        assert_eq!(once.public_claims, twice.public_claims);
        assert_eq!(once.semantic_candidates, twice.semantic_candidates);
    }

    #[test]
    fn replaying_the_same_resolution_twice_leaves_resolved_at_unchanged() {
        let mut doc = AgentDocument::new();
        let resolution = ResolutionEvent {
            key: "ceo".to_string(),
            winner_claim_hash: EventHash::new("h1"),
            suppressed_claim_hashes: vec![EventHash::new("h2")],
            decided_by: DecidedBy::Poll,
            poll: None,
        };
        let payload = EventPayload::ResolutionEvent(resolution);

        let changed = doc.apply(&payload, &EventHash::new("resolution-1"));
        assert!(changed);
        let first_resolved_at = doc.public_claims["ceo"].resolved_at;

        let changed = doc.apply(&payload, &EventHash::new("resolution-1"));
        assert!(!changed);
        assert_eq!(doc.public_claims["ceo"].resolved_at, first_resolved_at);
    }

    #[test]
    fn merge_unions_grow_only_sets_and_keeps_existing_public_claim() {
        let mut local = AgentDocument::new();
        local.apply_semantic_claim("ceo", EventHash::new("h1"));

        let mut remote = AgentDocument::new();
        remote.apply_semantic_claim("ceo", EventHash::new("h2"));

        let changed = local.merge(&remote);
        assert!(changed);
        assert_eq!(local.public_claims["ceo"].claim_hash, EventHash::new("h1"));
        assert_eq!(local.semantic_candidates["ceo"].len(), 2);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut local = AgentDocument::new();
        local.apply_semantic_claim("ceo", EventHash::new("h1"));
        let remote = local.clone();

        let changed = local.merge(&remote);
        assert!(!changed);
    }

    #[test]
    fn skill_added_then_deprecated_tracks_status() {
        let mut doc = AgentDocument::new();
        doc.apply( &EventPayload::SkillAdded(SkillAdded {
                    name: "rust".to_string(),
                    description: "writes rust".to_string(),
                    confidence: 0.8,
                    source: None,
            }),
            &EventHash::new("h1"),
        );
        assert_eq!(doc.skills["rust"].status, SkillStatus::Active);

        doc.apply( &EventPayload::SkillDeprecated(SkillDeprecated {
                    name: "rust".to_string(),
                    reason: Some("superseded".to_string()),
            }),
            &EventHash::new("h2"),
        );
        assert_eq!(doc.skills["rust"].status, SkillStatus::Deprecated);
    }

    #[test]
    fn persona_updated_merges_fields() {
        let mut doc = AgentDocument::new();
        let mut fields = BTreeMap::new();
        fields.insert("designation".to_string(), "CEO".to_string());
        doc.apply( &EventPayload::PersonaUpdated(PersonaUpdated { fields }),
            &EventHash::new("h1"),
        );
        assert_eq!(doc.agent_profile["designation"], "CEO");
    }
}

