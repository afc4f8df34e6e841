// ABOUTME: Site store error types with SNAFU pattern.
// ABOUTME: Carries file paths for I/O failures and exposes a kind for programmatic handling.

use snafu::Snafu;
use std::path::PathBuf;

use super::vault::VaultError;
use crate::site::ValidationErrors;
use crate::types::SiteId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("site {id} not found"))]
    NotFound { id: SiteId },

    #[snafu(display("{source}"))]
    Conflict { source: ValidationErrors },

    #[snafu(display("failed to access {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to encode site records: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("corrupt store file {}: {source}", path.display()))]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("secret vault error: {source}"))]
    Vault { source: VaultError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    /// A uniqueness rule rejected the write.
    Conflict,
    Io,
    /// Stored data could not be encoded or decoded.
    Corrupt,
    Secrets,
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            StoreError::NotFound { .. } => StoreErrorKind::NotFound,
            StoreError::Conflict { .. } => StoreErrorKind::Conflict,
            StoreError::Io { .. } => StoreErrorKind::Io,
            StoreError::Encode { .. } | StoreError::Decode { .. } => StoreErrorKind::Corrupt,
            StoreError::Vault { .. } => StoreErrorKind::Secrets,
        }
    }
}

impl From<ValidationErrors> for StoreError {
    fn from(source: ValidationErrors) -> Self {
        StoreError::Conflict { source }
    }
}

impl From<VaultError> for StoreError {
    fn from(source: VaultError) -> Self {
        StoreError::Vault { source }
    }
}
