// ABOUTME: Configuration types and parsing for pressdock.yml.
// ABOUTME: Store and secrets paths, SSH and deploy settings, images and the monitor token.

mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::init_config;

use crate::compose::Images;
use crate::deploy::{DEFAULT_SETTLE_DELAY, DeploySettings};
use crate::error::{Error, Result};
use crate::remote::{DEFAULT_ROOT, RemoteLayout};
use crate::ssh::SshSettings;
use crate::types::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "pressdock.yml";
pub const CONFIG_FILENAME_ALT: &str = "pressdock.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".pressdock/config.yml";

/// Top-level `pressdock.yml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub secrets: SecretsConfig,
    pub remote: RemoteConfig,
    pub deploy: DeployConfig,
    pub compose: Images,
    pub monitor: MonitorConfig,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".pressdock/sites.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// age identity used to seal credentials at rest.
    pub identity: PathBuf,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            identity: PathBuf::from(".pressdock/identity.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// Parent directory of every stack on the remote host.
    pub root: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
    pub trust_first_connection: bool,
    pub known_hosts: Option<PathBuf>,
    /// Treat output containing "error" as a failure even on exit status 0.
    pub output_heuristic: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(300),
            trust_first_connection: true,
            known_hosts: None,
            output_heuristic: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    pub token: Option<EnvValue>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = config_base_dir(path);
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if self.remote.root.trim().is_empty() {
            return Err(Error::InvalidConfig("remote.root must not be empty".to_string()));
        }
        if self.remote.root.contains(char::is_whitespace) {
            return Err(Error::InvalidConfig(
                "remote.root must not contain whitespace".to_string(),
            ));
        }
        if self.remote.command_timeout.is_zero() || self.remote.connect_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "remote timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.resolve(&self.secrets.identity)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let path = expand_home(path);
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn ssh_settings(&self) -> SshSettings {
        SshSettings {
            trust_on_first_use: self.remote.trust_first_connection,
            known_hosts_path: self.remote.known_hosts.as_deref().map(expand_home),
            connect_timeout: self.remote.connect_timeout,
            command_timeout: self.remote.command_timeout,
        }
    }

    pub fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            layout: RemoteLayout::new(self.remote.root.clone()),
            settle_delay: self.deploy.settle_delay,
            images: self.compose.clone(),
        }
    }

    /// The configured monitor token, if any.
    pub fn monitor_token(&self) -> Result<Option<Secret>> {
        self.monitor
            .token
            .as_ref()
            .map(EnvValue::resolve_secret)
            .transpose()
    }
}

/// `.pressdock/config.yml` lives one level below the project directory.
fn config_base_dir(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    if parent.file_name().is_some_and(|n| n == ".pressdock") {
        parent.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}
