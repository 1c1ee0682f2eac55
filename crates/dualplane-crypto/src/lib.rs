//! dualplane-crypto - Ed25519 signing and SHA-384 hashing for the
//! dual-plane agent synchronization substrate
//!
//! - `Keypair`, `verify_signature`: instance authentication (/§5.3)
//! - `hash_sha384`, `hash_object`, `canonical_json_bytes`: deterministic
//! event hashing over stable-key-order JSON
//! - `encode_base64`, `decode_base64`: the wire transport's padded base64,
//! accepting unpadded input

pub mod crypto;
pub mod error;

pub use crypto::*;
pub use error::*;

