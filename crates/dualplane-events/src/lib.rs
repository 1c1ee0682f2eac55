//! dualplane-events - Typed event envelope and canonical hash chain for the
//! dual-plane agent synchronization substrate
//!
//! Events are immutable records over the closed set of primitives in spec
//! §4.3. `EventPayload` is a tagged variant (replacement for
//! dynamically-typed payload dispatch); the `Other` variant preserves any
//! event type the core does not recognize so the ledger never rejects a
//! forward-compatible writer.

pub mod envelope;
pub mod payload;

pub use envelope::*;
pub use payload::*;

