//! Errors for dualplane-projector.

use dualplane_types::{AsErrorKind, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ProjectorError {
    #[error("unknown room: {room}")]
    RoomNotFound { room: String },

    #[error("malformed incremental update")]
    MalformedUpdate,
}

impl AsErrorKind for ProjectorError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProjectorError::RoomNotFound { .. } => ErrorKind::NotFound,
            ProjectorError::MalformedUpdate => ErrorKind::Validation,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ProjectorError::RoomNotFound { .. } => "room_not_found",
            ProjectorError::MalformedUpdate => "malformed_update",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectorError>;
