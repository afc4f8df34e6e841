// ABOUTME: Transport seam between the remote executor and a concrete SSH client.
// ABOUTME: Connector opens sessions; RemoteShell runs commands and is consumed on close.

use super::client::{CommandOutput, Endpoint, Session, SessionConfig};
use super::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// An open, authenticated shell session on a remote host.
#[async_trait]
pub trait RemoteShell: Send + Sync + Sized {
    /// Run one command and wait for it to finish.
    async fn exec(&self, command: &str) -> Result<CommandOutput>;

    /// Close the session. The value cannot be used afterwards.
    async fn close(self) -> Result<()>;
}

/// Opens sessions to remote hosts.
#[async_trait]
pub trait Connector: Send + Sync {
    type Shell: RemoteShell;

    async fn open(&self, endpoint: Endpoint) -> Result<Self::Shell>;
}

#[async_trait]
impl RemoteShell for Session {
    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        Session::exec(self, command).await
    }

    async fn close(self) -> Result<()> {
        self.disconnect().await
    }
}

/// Host-independent SSH options applied to every session.
#[derive(Debug, Clone)]
pub struct SshSettings {
    pub trust_on_first_use: bool,
    pub known_hosts_path: Option<PathBuf>,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            trust_on_first_use: false,
            known_hosts_path: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(300),
        }
    }
}

/// [`Connector`] backed by russh.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    settings: SshSettings,
}

impl SshConnector {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    fn session_config(&self, endpoint: Endpoint) -> SessionConfig {
        let config = SessionConfig::new(endpoint)
            .trust_on_first_use(self.settings.trust_on_first_use)
            .connect_timeout(self.settings.connect_timeout)
            .command_timeout(self.settings.command_timeout);
        match &self.settings.known_hosts_path {
            Some(path) => config.known_hosts_path(path),
            None => config,
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Shell = Session;

    async fn open(&self, endpoint: Endpoint) -> Result<Session> {
        Session::connect(self.session_config(endpoint)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::Credential;
    use crate::types::Secret;

    #[test]
    fn session_config_carries_settings() {
        let connector = SshConnector::new(SshSettings {
            trust_on_first_use: true,
            known_hosts_path: Some(PathBuf::from("/tmp/known_hosts")),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(60),
        });
        let config = connector.session_config(Endpoint {
            host: "10.0.0.5".to_string(),
            port: 2222,
            user: "deploy".to_string(),
            credential: Credential::Password(Secret::new("pw")),
        });

        assert!(config.trust_on_first_use);
        assert_eq!(
            config.known_hosts_path.as_deref(),
            Some(std::path::Path::new("/tmp/known_hosts"))
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.command_timeout, Duration::from_secs(60));
        assert_eq!(config.endpoint.port, 2222);
    }
}
