//! dualplane-types - Canonical domain types for the dual-plane agent
//! synchronization substrate
//!
//! This crate has zero dependencies on other `dualplane` crates. It defines:
//!
//! - Identity types (`AgentId`, `InstanceId`, `EventId`, `EventHash`,
//!   `TxId`, `PollId`)
//! - The shared error-kind taxonomy every domain crate classifies into

pub mod error;
pub mod identity;

pub use error::*;
pub use identity::*;

/// Version of the dualplane types schema.
pub const TYPES_VERSION: &str = "0.1.0";
