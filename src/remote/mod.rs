// ABOUTME: Remote executor: logged connect, run, and disconnect against one host.
// ABOUTME: Every step is recorded in the caller's transcript; sessions are explicit values.

mod commands;

pub use commands::{DEFAULT_ROOT, RemoteCommand, RemoteLayout, drop_database, settle};

use crate::deploy::DeployError;
use crate::site::{AuthMethod, Server};
use crate::ssh::{self, Connector, Credential, Endpoint, RemoteShell};
use crate::transcript::DeploymentLog;

/// Drives a [`Connector`] and records each step in a [`DeploymentLog`].
///
/// Holds no session state: `connect` returns the session, which callers pass
/// back to `run` and finally hand to `disconnect`.
#[derive(Debug, Clone)]
pub struct Executor<C> {
    connector: C,
    output_heuristic: bool,
}

impl<C: Connector> Executor<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            output_heuristic: true,
        }
    }

    /// Also treat output containing "error" as a failure, whatever the exit status.
    pub fn output_heuristic(mut self, enabled: bool) -> Self {
        self.output_heuristic = enabled;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open and authenticate a session to `server`.
    pub async fn connect(
        &self,
        server: &Server,
        log: &mut DeploymentLog,
    ) -> Result<C::Shell, DeployError> {
        log.info(format!(
            "Initializing SSH connection to {}",
            server.address()
        ));

        let Some(credential) = choose_credential(server) else {
            log.error("No authentication method provided");
            log.error("SSH connection failed: no SSH key or password provided");
            return Err(DeployError::Authentication(
                "no SSH key or password provided".to_string(),
            ));
        };
        let label = credential.label();

        log.info(format!(
            "Attempting {label} authentication for user: {}",
            server.username
        ));

        let endpoint = Endpoint {
            host: server.ip.to_string(),
            port: server.port,
            user: server.username.clone(),
            credential,
        };

        match self.connector.open(endpoint).await {
            Ok(shell) => {
                log.success(format!("Successfully authenticated with {label}"));
                log.success("SSH connection established successfully");
                Ok(shell)
            }
            Err(e) => {
                if e.is_authentication() {
                    log.error(format!("SSH {label} authentication failed"));
                }
                log.error(format!("SSH connection failed: {e}"));
                Err(connect_error(e))
            }
        }
    }

    /// Run one command, ingesting its output into the transcript.
    ///
    /// Fails on a non-zero exit status, and on output mentioning "error" when
    /// the heuristic is enabled.
    pub async fn run(
        &self,
        shell: &C::Shell,
        command: &RemoteCommand,
        log: &mut DeploymentLog,
    ) -> Result<String, DeployError> {
        log.info(format!("Executing command: {}", command.display()));

        let output = match shell.exec(command.command()).await {
            Ok(output) => output,
            Err(e) => {
                log.error(format!("Command failed: {} | {e}", command.display()));
                return Err(exec_error(e, command));
            }
        };

        let combined = output.combined();
        log.ingest_raw_output(&combined);

        let heuristic_hit = self.output_heuristic && output.mentions_error();
        if !output.success() || heuristic_hit {
            log.error(format!(
                "Command failed: {} | exit status {}",
                command.display(),
                output.exit_code
            ));
            return Err(DeployError::CommandFailure {
                command: command.display().to_string(),
                exit_code: Some(output.exit_code),
                output: combined,
            });
        }

        log.success(format!("Command executed successfully: {}", command.display()));
        Ok(combined)
    }

    /// Close the session. Failures are recorded as warnings, never raised.
    pub async fn disconnect(&self, shell: C::Shell, log: &mut DeploymentLog) {
        log.info("Disconnecting SSH session");
        if let Err(e) = shell.close().await {
            log.warning(format!("SSH disconnect did not complete cleanly: {e}"));
        }
    }
}

fn choose_credential(server: &Server) -> Option<Credential> {
    let password = server.password.as_ref().filter(|p| !p.is_empty());
    let key = server.private_key.as_ref().filter(|k| !k.is_empty());

    match server.auth_method {
        AuthMethod::Password => password.map(|p| Credential::Password(p.clone())),
        AuthMethod::Key => key.map(|k| Credential::PrivateKey(k.clone())),
    }
}

fn connect_error(err: ssh::Error) -> DeployError {
    if err.is_authentication() {
        DeployError::Authentication(err.to_string())
    } else {
        DeployError::Connection(err.to_string())
    }
}

fn exec_error(err: ssh::Error, command: &RemoteCommand) -> DeployError {
    match err {
        ssh::Error::NoActiveSession => DeployError::NoActiveSession,
        ssh::Error::CommandTimeout(timeout) => DeployError::CommandTimeout {
            command: command.display().to_string(),
            timeout,
        },
        other => DeployError::CommandFailure {
            command: command.display().to_string(),
            exit_code: None,
            output: other.to_string(),
        },
    }
}
