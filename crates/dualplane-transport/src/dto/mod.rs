//! Wire-level request/response bodies for the private plane.
//!
//! Outer envelope fields use `camelCase` to match JSON bodies
//! verbatim (`agentId`, `publicKeyBase64`, ...); nested domain types
//! (`dualplane_events::Event`) keep their own Rust field names, since the
//! canonical-hash contract only requires the server's encoder
//! to be self-consistent, not to match a particular wire casing.

pub mod ledger;
pub mod registry;
pub mod voting;

pub use ledger::*;
pub use registry::*;
pub use voting::*;

