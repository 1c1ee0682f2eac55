//! Error types for dualplane-crypto
//!
//! All errors are designed to fail closed - when in doubt, deny the action.

use dualplane_types::{AsErrorKind, ErrorKind};
use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key: {message}")]
    InvalidPublicKey { message: String },

    #[error("invalid hex encoding: {message}")]
    InvalidHex { message: String },

    #[error("invalid base64 encoding: {message}")]
    InvalidBase64 { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        CryptoError::InvalidSignature
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(e: serde_json::Error) -> Self {
        CryptoError::Serialization {
            message: e.to_string(),
        }
    }
}

impl AsErrorKind for CryptoError {
    fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::InvalidSignature => ErrorKind::Authentication,
            CryptoError::InvalidPublicKey { .. }
            | CryptoError::InvalidHex { .. }
            | CryptoError::InvalidBase64 { .. } => ErrorKind::Validation,
            CryptoError::Serialization { .. } => ErrorKind::Internal,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            CryptoError::InvalidSignature => "invalid_signature",
            CryptoError::InvalidPublicKey { .. } => "invalid_public_key",
            CryptoError::InvalidHex { .. } => "invalid_hex",
            CryptoError::InvalidBase64 { .. } => "invalid_base64",
            CryptoError::Serialization { .. } => "serialization_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, CryptoError>;
