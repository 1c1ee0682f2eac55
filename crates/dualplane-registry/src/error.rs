//! Errors for dualplane-registry ("Failure semantics").

use dualplane_types::{AsErrorKind, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("instance not registered: {agent_id}/{instance_id}")]
    InstanceNotRegistered {
        agent_id: String,
        instance_id: String,
    },

    #[error("signature does not verify")]
    InvalidSignature,

    #[error("missing field: {field}")]
    MissingField { field: &'static str },
}

impl AsErrorKind for RegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::InstanceNotRegistered { .. } => ErrorKind::Conflict,
            RegistryError::InvalidSignature => ErrorKind::Authentication,
            RegistryError::MissingField { .. } => ErrorKind::Validation,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RegistryError::InstanceNotRegistered { .. } => "instance_not_registered",
            RegistryError::InvalidSignature => "invalid_signature",
            RegistryError::MissingField { .. } => "missing_field",
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

