//! The closed set of event payloads.
//!
//! Each variant of [`EventPayload`] carries the data specific to one event
//! type. Serialization is internally tagged on a `type` field so the wire
//! form matches the JSON bodies POSTed to `/ledger/commit`.

use std::collections::BTreeMap;

use dualplane_types::EventHash;
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The five primitives events are scoped to ("Event").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Persona,
    Rights,
    Skills,
    EpisodicMemory,
    SemanticMemory,
}

/// Update to one or more fields of an agent's persona/profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaUpdated {
    /// Profile field name -> new value (e.g. `designation`, `bio`, `occupation`).
    pub fields: BTreeMap<String, String>,
}

/// A capability/permission grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightGranted {
    pub right: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// A capability/permission revocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RightRevoked {
    pub right: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Emitted by the identity registry when a rotation succeeds,
/// so it is replayable and auditable like any other event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRotated {
    pub instance_id: String,
    pub new_public_key_base64: String,
}

/// A new skill, learned or granted to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAdded {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A skill no longer considered active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDeprecated {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A single episodic memory entry ("episodic_memory" primitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemoryAdded {
    pub summary: String,
    pub occurred_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A semantic claim proposal ("Semantic claim").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticClaimUpserted {
    pub key: String,
    pub value: String,
    pub confidence: f64,
    pub provenance: String,
}

/// Which mechanism decided a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    GroundTruthService,
    Poll,
}

/// Embedded poll summary carried by a poll-decided resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSummary {
    pub quorum_required: usize,
    pub quorum_reached: usize,
    pub votes: BTreeMap<String, EventHash>,
}

/// Fixes the public winner for one `(agentId, key)` ("Resolution event").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionEvent {
    pub key: String,
    pub winner_claim_hash: EventHash,
    pub suppressed_claim_hashes: Vec<EventHash>,
    pub decided_by: DecidedBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollSummary>,
}

/// The closed event-type set of spec §4.3, plus a catch-all for forward
/// compatibility ("Implementers may extend this set").
///
/// Serialization is hand-rolled rather than derived: serde's internal
/// tagging (`#[serde(tag = "type")]`) cannot express a catch-all variant
/// that also preserves unrecognized fields, so `EventPayload` serializes
/// through a `serde_json::Value` and stitches the `type` discriminator in
/// (or reads it back out) itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    PersonaUpdated(PersonaUpdated),
    RightGranted(RightGranted),
    RightRevoked(RightRevoked),
    KeyRotated(KeyRotated),
    SkillAdded(SkillAdded),
    SkillDeprecated(SkillDeprecated),
    EpisodicMemoryAdded(EpisodicMemoryAdded),
    SemanticClaimUpserted(SemanticClaimUpserted),
    ResolutionEvent(ResolutionEvent),
    /// Any event type this build of the core does not recognize. Preserved
    /// verbatim in the ledger; produces no CRDT effect (spec §4.6's
    /// transform table: "other | Ignore").
    Other { type_name: String, raw: Value },
}

impl Serialize for EventPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
    S: Serializer,
    {
        let mut value = match self {
            EventPayload::PersonaUpdated(p) => serde_json::to_value(p),
            EventPayload::RightGranted(p) => serde_json::to_value(p),
            EventPayload::RightRevoked(p) => serde_json::to_value(p),
            EventPayload::KeyRotated(p) => serde_json::to_value(p),
            EventPayload::SkillAdded(p) => serde_json::to_value(p),
            EventPayload::SkillDeprecated(p) => serde_json::to_value(p),
            EventPayload::EpisodicMemoryAdded(p) => serde_json::to_value(p),
            EventPayload::SemanticClaimUpserted(p) => serde_json::to_value(p),
            EventPayload::ResolutionEvent(p) => serde_json::to_value(p),
            EventPayload::Other { raw, .. } => Ok(raw.clone()),
        }
        .map_err(S::Error::custom)?;

        match value {
            Value::Object(ref mut map) => {
                map.insert( "type".to_string(),
                    Value::String(self.type_name().to_string()),
                );
            }
            _ => return Err(S::Error::custom("event payload must serialize to an object")),
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
    D: Deserializer<'de>,
    {
        let mut value = Value::deserialize(deserializer)?;
        let type_name = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| D::Error::missing_field("type"))?
        .to_string();

        let object = value
        .as_object_mut()
        .ok_or_else(|| D::Error::custom("event payload must be a JSON object"))?;
        object.remove("type");

        macro_rules! decode {
            ($variant:ident) => {
                serde_json::from_value(value)
                .map(EventPayload::$variant)
                .map_err(D::Error::custom)
            };
        }

        match type_name.as_str() {
            "PersonaUpdated" => decode!(PersonaUpdated),
            "RightGranted" => decode!(RightGranted),
            "RightRevoked" => decode!(RightRevoked),
            "KeyRotated" => decode!(KeyRotated),
            "SkillAdded" => decode!(SkillAdded),
            "SkillDeprecated" => decode!(SkillDeprecated),
            "EpisodicMemoryAdded" => decode!(EpisodicMemoryAdded),
            "SemanticClaimUpserted" => decode!(SemanticClaimUpserted),
            "ResolutionEvent" => decode!(ResolutionEvent),
            other => Ok(EventPayload::Other {
                    type_name: other.to_string(),
                    raw: value,
            }),
        }
    }
}

impl EventPayload {
    /// The primitive this payload belongs to (event -> primitive table).
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            EventPayload::PersonaUpdated(_) => Some(Primitive::Persona),
            EventPayload::RightGranted(_) | EventPayload::RightRevoked(_) => {
                Some(Primitive::Rights)
            }
            EventPayload::KeyRotated(_) => Some(Primitive::Rights),
            EventPayload::SkillAdded(_) | EventPayload::SkillDeprecated(_) => {
                Some(Primitive::Skills)
            }
            EventPayload::EpisodicMemoryAdded(_) => Some(Primitive::EpisodicMemory),
            EventPayload::SemanticClaimUpserted(_) | EventPayload::ResolutionEvent(_) => {
                Some(Primitive::SemanticMemory)
            }
            EventPayload::Other { .. } => None,
        }
    }

    /// The wire `type` discriminator for this payload.
    pub fn type_name(&self) -> &str {
        match self {
            EventPayload::PersonaUpdated(_) => "PersonaUpdated",
            EventPayload::RightGranted(_) => "RightGranted",
            EventPayload::RightRevoked(_) => "RightRevoked",
            EventPayload::KeyRotated(_) => "KeyRotated",
            EventPayload::SkillAdded(_) => "SkillAdded",
            EventPayload::SkillDeprecated(_) => "SkillDeprecated",
            EventPayload::EpisodicMemoryAdded(_) => "EpisodicMemoryAdded",
            EventPayload::SemanticClaimUpserted(_) => "SemanticClaimUpserted",
            EventPayload::ResolutionEvent(_) => "ResolutionEvent",
            EventPayload::Other { type_name, .. } => type_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_claim_round_trips_through_json() {
        let payload = EventPayload::SemanticClaimUpserted(SemanticClaimUpserted {
                key: "ceo".to_string(),
                value: "X".to_string(),
                confidence: 0.9,
                provenance: "instance-A".to_string(),
        });
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"SemanticClaimUpserted\""));
        let back: EventPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn unknown_type_falls_back_to_other() {
        let json = r#"{"type":"FutureEventType","foo":"bar"}"#;
        let payload: EventPayload = serde_json::from_str(json).unwrap();
        match &payload {
            EventPayload::Other { type_name, raw } => {
                assert_eq!(type_name, "FutureEventType");
                assert_eq!(raw["foo"], "bar");
            }
            other => panic!("expected Other, got {other:?}"),
        }
        assert!(matches!(payload_primitive(&payload), None));
    }

    fn payload_primitive(p: &EventPayload) -> Option<Primitive> {
        p.primitive()
    }

    #[test]
    fn primitive_table_matches_spec() {
        let skill = EventPayload::SkillAdded(SkillAdded {
                name: "rust".to_string(),
                description: "writes Rust".to_string(),
                confidence: 1.0,
                source: None,
        });
        assert_eq!(skill.primitive(), Some(Primitive::Skills));
    }
}

