// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted SSH connector, a recording store, and site fixtures.

use std::path::PathBuf;
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pressdock::deploy::{DeploySettings, Orchestrator};
use pressdock::remote::Executor;
use pressdock::site::{AuthMethod, NewSite, Server, Site, SiteConfig, WpAdmin};
use pressdock::ssh::{self, CommandOutput, Connector, Endpoint, RemoteShell};
use pressdock::store::{MemoryStore, Page, Paginated, SiteStore, StoreError};
use pressdock::types::{Secret, SiteId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("pressdock=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[derive(Clone, Copy)]
enum Refusal {
    Unreachable,
    BadCredential,
}

#[derive(Default)]
struct State {
    commands: Vec<String>,
    endpoints: Vec<Endpoint>,
    rules: Vec<(String, CommandOutput)>,
    refusal: Option<Refusal>,
    delay: Option<Duration>,
    open: usize,
    max_open: usize,
}

/// In-process stand-in for an SSH server.
///
/// Every command succeeds with empty output unless a rule matches it.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct ScriptedConnector {
    state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` return `output` instead.
    pub fn respond(&self, needle: &str, output: CommandOutput) {
        self.state.lock().rules.push((needle.to_string(), output));
    }

    /// Commands containing `needle` exit with status 1.
    pub fn fail_on(&self, needle: &str) {
        self.respond(
            needle,
            CommandOutput {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("{needle}: failed"),
            },
        );
    }

    pub fn refuse_connections(&self) {
        self.state.lock().refusal = Some(Refusal::Unreachable);
    }

    pub fn reject_credentials(&self) {
        self.state.lock().refusal = Some(Refusal::BadCredential);
    }

    pub fn accept_connections(&self) {
        self.state.lock().refusal = None;
    }

    /// Hold every command for `delay` before answering.
    pub fn slow_commands(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.state.lock().commands.iter().any(|c| c.contains(needle))
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.state.lock().endpoints.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().open
    }

    pub fn max_concurrent_sessions(&self) -> usize {
        self.state.lock().max_open
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Shell = ScriptedShell;

    async fn open(&self, endpoint: Endpoint) -> ssh::Result<ScriptedShell> {
        let mut state = self.state.lock();
        state.endpoints.push(endpoint.clone());
        match state.refusal {
            Some(Refusal::Unreachable) => {
                return Err(ssh::Error::Connection(format!(
                    "connection refused to {}:{}",
                    endpoint.host, endpoint.port
                )));
            }
            Some(Refusal::BadCredential) => return Err(ssh::Error::AuthenticationFailed),
            None => {}
        }
        state.open += 1;
        state.max_open = state.max_open.max(state.open);
        Ok(ScriptedShell {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct ScriptedShell {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn exec(&self, command: &str) -> ssh::Result<CommandOutput> {
        let delay = {
            let mut state = self.state.lock();
            state.commands.push(command.to_string());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock();
        let output = state
            .rules
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        Ok(output)
    }

    async fn close(self) -> ssh::Result<()> {
        self.state.lock().open -= 1;
        Ok(())
    }
}

#[derive(Default)]
struct Writes {
    created: Vec<Site>,
    attempted: Vec<Site>,
    reject_at: Option<usize>,
}

/// A [`MemoryStore`] that records every created record and every record
/// passed to `update`.
///
/// After `reject_update(n)`, the n-th recorded update (1-based) is rejected
/// with an I/O error and leaves the store unchanged.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: Arc<Mutex<Writes>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_update(&self, n: usize) {
        self.writes.lock().reject_at = Some(n);
    }

    pub fn created(&self) -> Vec<Site> {
        self.writes.lock().created.clone()
    }

    /// Records handed to `update`, including rejected ones, in call order.
    pub fn writes(&self) -> Vec<Site> {
        self.writes.lock().attempted.clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().attempted.clear();
    }
}

#[async_trait]
impl SiteStore for RecordingStore {
    async fn create(&self, new: NewSite) -> Result<Site, StoreError> {
        let site = self.inner.create(new).await?;
        self.writes.lock().created.push(site.clone());
        Ok(site)
    }

    async fn find(&self, id: SiteId) -> Result<Site, StoreError> {
        self.inner.find(id).await
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        self.inner.find_by_domain(domain).await
    }

    async fn update(&self, site: &Site) -> Result<Site, StoreError> {
        let rejected = {
            let mut writes = self.writes.lock();
            writes.attempted.push(site.clone());
            writes.reject_at == Some(writes.attempted.len())
        };
        if rejected {
            return Err(StoreError::Io {
                path: PathBuf::from("sites.json"),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.update(site).await
    }

    async fn delete(&self, id: SiteId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }

    async fn list(&self, page: Page) -> Result<Paginated<Site>, StoreError> {
        self.inner.list(page).await
    }
}

/// Settings with no settle delay, so tests never wait.
#[allow(dead_code)]
pub fn fast_settings() -> DeploySettings {
    DeploySettings {
        settle_delay: Duration::ZERO,
        ..DeploySettings::default()
    }
}

#[allow(dead_code)]
pub fn orchestrator<S: SiteStore>(
    store: S,
    connector: ScriptedConnector,
) -> Orchestrator<S, ScriptedConnector> {
    Orchestrator::new(store, Executor::new(connector), fast_settings())
}

#[allow(dead_code)]
pub fn site_config(domain: &str, http_port: u16) -> SiteConfig {
    SiteConfig {
        domain: domain.to_string(),
        http_port,
        admin: WpAdmin {
            user: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: Secret::new("correct-horse-battery"),
        },
        server: Server {
            ip: "203.0.113.10".parse().unwrap(),
            port: 22,
            username: "root".to_string(),
            auth_method: AuthMethod::Password,
            password: Some(Secret::new("ssh-password")),
            private_key: None,
        },
    }
}
