//! Cryptographic primitives for the dual-plane substrate
//!
//! All instance signing and verification is Ed25519. Keys and signatures
//! are stored as hex for internal bookkeeping; the wire format
//! accepts both hex and base64 and always emits base64, padded.
//! Event hashing is SHA-384 over a canonical (stable-key-order) JSON
//! encoding, never over the serializer's incidental field order.

use std::collections::BTreeMap;

use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha384};

use crate::error::{CryptoError, Result};

/// A keypair for signing operations.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Create from a seed (32 bytes).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key as a hex string.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Get the public key as padded base64, the wire format emits.
    pub fn public_key_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD
        .encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Sign a message, returning a hex-encoded signature.
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        hex::encode(signature.to_bytes())
    }

    /// Sign a message, returning a padded-base64-encoded signature.
    pub fn sign_base64(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        base64::engine::general_purpose::STANDARD.encode(signature.to_bytes())
    }

    /// Get the verifying key for verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

/// Decode a public key that may be hex or base64 (padded or unpadded).
fn decode_public_key(encoded: &str) -> Result<[u8; 32]> {
    let bytes = decode_flexible(encoded).map_err(|message| CryptoError::InvalidPublicKey {
            message,
    })?;
    bytes
    .try_into()
    .map_err(|_| CryptoError::InvalidPublicKey {
            message: "public key must decode to 32 bytes".to_string(),
    })
}

/// Decode a signature that may be hex or base64 (padded or unpadded).
fn decode_signature(encoded: &str) -> Result<[u8; 64]> {
    let bytes = decode_flexible(encoded).map_err(|_| CryptoError::InvalidSignature)?;
    bytes.try_into().map_err(|_| CryptoError::InvalidSignature)
}

/// Try hex first (the internal storage format), then base64 padded, then
/// base64 unpadded, since the wire format accepts any of the three on
/// input (spec §6.2).
fn decode_flexible(encoded: &str) -> std::result::Result<Vec<u8>, String> {
    if let Ok(bytes) = hex::decode(encoded) {
        return Ok(bytes);
    }
    if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(encoded) {
        return Ok(bytes);
    }
    base64::engine::general_purpose::STANDARD_NO_PAD
    .decode(encoded)
    .map_err(|e| format!("not valid hex or base64: {}", e))
}

/// Verify a signature against a public key. Both may be hex or base64.
pub fn verify_signature(public_key: &str, message: &[u8], signature: &str) -> Result<()> {
    let public_key_bytes = decode_public_key(public_key)?;
    let verifying_key =
    VerifyingKey::from_bytes(&public_key_bytes).map_err(|e| CryptoError::InvalidPublicKey {
            message: e.to_string(),
    })?;

    let signature_bytes = decode_signature(signature)?;
    let signature = Signature::from_bytes(&signature_bytes);

    verifying_key.verify(message, &signature)?;
    Ok(())
}

/// Compute the SHA-384 hash of data, lowercase hex encoded.
pub fn hash_sha384(data: &[u8]) -> String {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the raw 48-byte SHA-384 digest of `data`.
///
/// Spec §6.2 describes every signature message as "Ed25519 over SHA-384
/// of the UTF-8 byte representation of the string... the signature
/// covers the 48-byte digest, not the string" — this is the one place
/// that hash is taken.
pub fn hash_sha384_raw(data: &[u8]) -> [u8; 48] {
    let mut hasher = Sha384::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Sign a §6.2 signature message: hash `message` with SHA-384 and sign the
/// raw digest, returning a padded-base64 signature.
pub fn sign_message(keypair: &Keypair, message: &str) -> String {
    let digest = hash_sha384_raw(message.as_bytes());
    keypair.sign_base64(&digest)
}

/// Verify a §6.2 signature message against `public_key`.
pub fn verify_message(public_key: &str, message: &str, signature: &str) -> Result<()> {
    let digest = hash_sha384_raw(message.as_bytes());
    verify_signature(public_key, &digest, signature)
}

/// Hash any serializable object via its canonical JSON encoding.
pub fn hash_object<T: Serialize>(obj: &T) -> Result<String> {
    let bytes = canonical_json_bytes(obj)?;
    Ok(hash_sha384(&bytes))
}

/// Render `obj` as JSON with map keys sorted lexicographically at every
/// level, so two processes that construct the same logical event always
/// hash to the same bytes regardless of field-declaration or HashMap
/// iteration order.
pub fn canonical_json_bytes<T: Serialize>(obj: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(obj)?;
    let canonical = canonicalize(&value);
    Ok(serde_json::to_vec(&canonical)?)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
            .iter()
            .map(|(k, v)| (k.clone(), canonicalize(v)))
            .collect();
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Encode bytes as padded standard base64, the form spec §6.2 requires
/// implementations to emit on the wire.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 that may be padded or unpadded.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(encoded) {
        return Ok(bytes);
    }
    base64::engine::general_purpose::STANDARD_NO_PAD
    .decode(encoded)
    .map_err(|e| CryptoError::InvalidBase64 {
            message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_generation_produces_32_byte_key() {
        let kp = Keypair::generate();
        assert_eq!(kp.public_key_hex().len(), 64);
    }

    #[test]
    fn sign_and_verify_hex_roundtrip() {
        let kp = Keypair::generate();
        let message = b"persona updated";
        let signature = kp.sign(message);
        assert!(verify_signature(&kp.public_key_hex(), message, &signature).is_ok());
    }

    #[test]
    fn sign_and_verify_base64_roundtrip() {
        let kp = Keypair::generate();
        let message = b"persona updated";
        let signature = kp.sign_base64(message);
        assert!(verify_signature(&kp.public_key_base64(), message, &signature).is_ok());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = Keypair::generate();
        let message = b"right granted";
        let signature = kp.sign(message);
        assert!(verify_signature(&kp.public_key_hex(), b"right revoked", &signature).is_err());
    }

    #[test]
    fn hash_sha384_is_96_hex_chars() {
        let hash = hash_sha384(b"some event bytes");
        assert_eq!(hash.len(), 96);
        assert_eq!(hash, hash_sha384(b"some event bytes"));
    }

    #[test]
    fn canonical_json_is_stable_under_field_reordering() {
        #[derive(Serialize)]
        struct A {
            z: u32,
            a: u32,
        }
        #[derive(Serialize)]
        struct B {
            a: u32,
            z: u32,
        }

        let a = A { z: 1, a: 2 };
        let b = B { a: 2, z: 1 };

        assert_eq!(hash_object(&a).unwrap(), hash_object(&b).unwrap());
    }

    #[test]
    fn base64_decode_accepts_padded_and_unpadded() {
        let bytes = b"agent instance key material";
        let padded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let unpadded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(bytes);

        assert_eq!(decode_base64(&padded).unwrap(), bytes);
        assert_eq!(decode_base64(&unpadded).unwrap(), bytes);
    }

    #[test]
    fn sign_message_verifies_against_same_message() {
        let kp = Keypair::generate();
        let message = "agent1:instanceA:2026-01-01T00:00:00Z";
        let signature = sign_message(&kp, message);
        assert!(verify_message(&kp.public_key_base64(), message, &signature).is_ok());
    }

    #[test]
    fn sign_message_rejects_tampered_message() {
        let kp = Keypair::generate();
        let signature = sign_message(&kp, "pollId123:hashA");
        assert!(verify_message(&kp.public_key_base64(), "pollId123:hashB", &signature).is_err());
    }

    #[test]
    fn hash_sha384_raw_is_48_bytes() {
        assert_eq!(hash_sha384_raw(b"some bytes").len(), 48);
    }
}

