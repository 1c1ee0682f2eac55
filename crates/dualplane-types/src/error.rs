//! Shared error taxonomy for the dual-plane substrate
//!
//! Every domain crate (`dualplane-ledger`, `dualplane-registry`,
//! `dualplane-voting`, ...) defines its own `thiserror` enum scoped to its
//! bounded context, but every variant across the whole workspace maps onto
//! exactly one of the five kinds below . `ErrorKind::status_code`
//! is the single mechanical place the transport layer consults to turn a
//! domain error into an HTTP response, so domain crates never depend on
//! `axum`.

use thiserror::Error;

/// The five error kinds the core distinguishes. Not a type implementors
/// return directly — each crate's error enum implements [`AsErrorKind`] to
/// classify its own variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed fields. Never retried by the core.
    Validation,
    /// Signature does not verify, or credentials don't match the registry.
    Authentication,
    /// Query by unknown ID.
    NotFound,
    /// Candidate/key mismatch, conflicting double-registration, etc.
    Conflict,
    /// Unexpected failure in persistence, broadcast, or projection.
    Internal,
}

impl ErrorKind {
    /// The numeric HTTP status /§7 assigns to this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 403,
            ErrorKind::Internal => 500,
        }
    }
}

/// Implemented by every crate-local error enum so the transport layer can
/// classify an error without knowing its concrete type.
pub trait AsErrorKind {
    fn kind(&self) -> ErrorKind;

    /// Stable machine-readable code, analogous to `OpeniBankError::error_code`.
    fn code(&self) -> &'static str;
}

/// A small catch-all error for callers that only need the taxonomy (e.g.
/// doc examples, glue code in `dualplane-server`) without a bespoke enum.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }
}

impl AsErrorKind for CoreError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn code(&self) -> &'static str {
        self.code
    }
}
