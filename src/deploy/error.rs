// ABOUTME: Error types for orchestration operations.
// ABOUTME: Authentication, connection, command, validation, lookup, and store failures.

use std::time::Duration;

use crate::compose;
use crate::site::ValidationErrors;
use crate::store::StoreError;
use crate::types::SiteId;

/// Errors raised by the orchestrator after the failure has been recorded.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Missing or rejected SSH credential.
    #[error("SSH authentication failed: {0}")]
    Authentication(String),

    /// The host could not be reached.
    #[error("SSH connection failed: {0}")]
    Connection(String),

    #[error("no active SSH session")]
    NoActiveSession,

    /// A remote command exited non-zero or its output reported an error.
    #[error("command failed: {command}")]
    CommandFailure {
        command: String,
        exit_code: Option<u32>,
        output: String,
    },

    #[error("command timed out after {timeout:?}: {command}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("site {0} not found")]
    NotFound(SiteId),

    #[error("no site with domain {0}")]
    DomainNotFound(String),

    /// Another operation currently holds the site.
    #[error("site {0} is busy with another operation")]
    Busy(SiteId),

    #[error(transparent)]
    Render(#[from] compose::Error),

    #[error("site store error: {0}")]
    Store(StoreError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    Authentication,
    Connection,
    NoActiveSession,
    CommandFailure,
    CommandTimeout,
    Validation,
    NotFound,
    Busy,
    Render,
    Store,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Authentication(_) => DeployErrorKind::Authentication,
            DeployError::Connection(_) => DeployErrorKind::Connection,
            DeployError::NoActiveSession => DeployErrorKind::NoActiveSession,
            DeployError::CommandFailure { .. } => DeployErrorKind::CommandFailure,
            DeployError::CommandTimeout { .. } => DeployErrorKind::CommandTimeout,
            DeployError::Validation(_) => DeployErrorKind::Validation,
            DeployError::NotFound(_) | DeployError::DomainNotFound(_) => DeployErrorKind::NotFound,
            DeployError::Busy(_) => DeployErrorKind::Busy,
            DeployError::Render(_) => DeployErrorKind::Render,
            DeployError::Store(_) => DeployErrorKind::Store,
        }
    }

    /// Field-level messages when the error is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            DeployError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for DeployError {
    fn from(errors: ValidationErrors) -> Self {
        DeployError::Validation(errors)
    }
}

impl From<StoreError> for DeployError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => DeployError::NotFound(id),
            StoreError::Conflict { source } => DeployError::Validation(source),
            other => DeployError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflicts_surface_as_validation() {
        let err: DeployError =
            StoreError::from(ValidationErrors::single("http_port", "taken")).into();
        assert_eq!(err.kind(), DeployErrorKind::Validation);
        assert!(err.validation_errors().unwrap().has("http_port"));
    }

    #[test]
    fn store_not_found_keeps_id() {
        let err: DeployError = StoreError::NotFound {
            id: SiteId::new(7),
        }
        .into();
        assert!(matches!(err, DeployError::NotFound(id) if id.get() == 7));
    }
}
