//! Errors for dualplane-ledger ("Failure semantics").

use dualplane_types::{AsErrorKind, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("signature does not verify")]
    InvalidSignature,

    #[error("event hash does not match canonical hash of event")]
    EventHashMismatch,

    #[error("no record for the given txId/hash")]
    NotFound,

    #[error("tail limit must be between 1 and 1000")]
    InvalidLimit,
}

impl AsErrorKind for LedgerError {
    fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidSignature => ErrorKind::Authentication,
            LedgerError::EventHashMismatch | LedgerError::InvalidLimit => ErrorKind::Validation,
            LedgerError::NotFound => ErrorKind::NotFound,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidSignature => "invalid_signature",
            LedgerError::EventHashMismatch => "event_hash_mismatch",
            LedgerError::InvalidLimit => "invalid_limit",
            LedgerError::NotFound => "not_found",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

