//! Domain errors

use thiserror::Error;

/// Domain result type
pub type Result<T> = std::result::Result<T, DomainError>;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Session has no start time: {0}")]
    MissingStart(String),

    #[error("Invalid billing interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Collaborator failure: {0}")]
    CollaboratorFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
