// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection, authentication, key decoding, and exec failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("authentication failed: credential rejected by server")]
    AuthenticationFailed,

    #[error("failed to decode private key: {0}")]
    KeyDecode(String),

    #[error("no active session")]
    NoActiveSession,

    #[error("command execution failed: {0}")]
    CommandFailed(String),

    #[error("command timed out after {0:?}")]
    CommandTimeout(std::time::Duration),

    #[error("channel closed unexpectedly without exit status")]
    ChannelClosed,

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure is about the credential rather than reachability.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::AuthenticationFailed | Error::KeyDecode(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
