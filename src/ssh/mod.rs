// ABOUTME: SSH transport for remote hosts built on russh.
// ABOUTME: Password or private-key authentication, known_hosts checks, timed command exec.

mod client;
mod connector;
mod error;

pub use client::{CommandOutput, Credential, Endpoint, Session, SessionConfig};
pub use connector::{Connector, RemoteShell, SshConnector, SshSettings};
pub use error::{Error, Result};
