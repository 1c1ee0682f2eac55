//! dualplane-projector - CRDT read-model projection and per-room broadcast
//! (§4.7, §6.3)
//!
//! Tails the private ledger, applies each event to the affected agent's
//! CRDT document, escalates divergent semantic claims to the voting
//! coordinator via `dualplane-conflict`, and fans out incremental updates
//! to subscribers of that agent's room. Grounded on `resonancex-ws`'s
//! channel/broadcast shape, generalized from market-data channels to
//! per-agent CRDT rooms.

pub mod document;
pub mod error;
pub mod ingest;
pub mod rooms;

pub use document::{AgentDocument, PublicClaim, Skill, SkillStatus};
pub use error::{ProjectorError, Result};
pub use ingest::{IngestConfig, Projector};
pub use rooms::{room_name, RoomMessage, RoomRegistry, DEFAULT_ROOM_CAPACITY};

