//! Errors for dualplane-voting ("Failure semantics").

use dualplane_types::{AsErrorKind, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VotingError {
    #[error("unknown poll: {poll_id}")]
    PollNotFound { poll_id: String },

    #[error("a poll requires at least 2 candidates")]
    InsufficientCandidates,

    #[error("no registered instances for agent {agent_id}; cannot resolve")]
    NoRegisteredInstances { agent_id: String },

    #[error("poll belongs to a different agent")]
    AgentMismatch,

    #[error("claim hash is not one of the poll's candidates")]
    CandidateMismatch,

    #[error("instance not registered: {agent_id}/{instance_id}")]
    InstanceNotRegistered {
        agent_id: String,
        instance_id: String,
    },

    #[error("public key does not match the registry entry for this instance")]
    KeyMismatch,

    #[error("signature does not verify")]
    InvalidSignature,
}

impl AsErrorKind for VotingError {
    fn kind(&self) -> ErrorKind {
        match self {
            VotingError::PollNotFound { .. } => ErrorKind::NotFound,
            VotingError::InsufficientCandidates => ErrorKind::Validation,
            VotingError::NoRegisteredInstances { .. } => ErrorKind::Validation,
            VotingError::AgentMismatch => ErrorKind::Conflict,
            VotingError::CandidateMismatch => ErrorKind::Validation,
            VotingError::InstanceNotRegistered { .. } => ErrorKind::Conflict,
            VotingError::KeyMismatch => ErrorKind::Conflict,
            VotingError::InvalidSignature => ErrorKind::Authentication,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            VotingError::PollNotFound { .. } => "poll_not_found",
            VotingError::InsufficientCandidates => "insufficient_candidates",
            VotingError::NoRegisteredInstances { .. } => "no_registered_instances",
            VotingError::AgentMismatch => "agent_mismatch",
            VotingError::CandidateMismatch => "candidate_mismatch",
            VotingError::InstanceNotRegistered { .. } => "instance_not_registered",
            VotingError::KeyMismatch => "key_mismatch",
            VotingError::InvalidSignature => "invalid_signature",
        }
    }
}

pub type Result<T> = std::result::Result<T, VotingError>;

