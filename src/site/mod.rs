// ABOUTME: Site, server, and database records managed by the orchestrator.
// ABOUTME: Lifecycle status, authentication method, and operator-supplied site configuration.

mod credentials;
mod validation;

pub use credentials::{database_name, database_username, generate_database_password};
pub use validation::{FieldError, ValidationErrors, check_conflicts};

use crate::transcript::LogEntry;
use crate::types::{ContainerName, Secret, SiteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Lifecycle status of a site's remote stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    #[default]
    Stopped,
    Deploying,
    Running,
    Failed,
}

impl SiteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteStatus::Stopped => "stopped",
            SiteStatus::Deploying => "deploying",
            SiteStatus::Running => "running",
            SiteStatus::Failed => "failed",
        }
    }

    /// Colour used by status badges.
    pub fn color(self) -> &'static str {
        match self {
            SiteStatus::Running => "green",
            SiteStatus::Deploying => "yellow",
            SiteStatus::Stopped | SiteStatus::Failed => "red",
        }
    }
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stopped" => Ok(SiteStatus::Stopped),
            "deploying" => Ok(SiteStatus::Deploying),
            "running" => Ok(SiteStatus::Running),
            "failed" => Ok(SiteStatus::Failed),
            other => Err(format!(
                "unknown status '{other}' (expected running, stopped, failed or deploying)"
            )),
        }
    }
}

/// How the orchestrator authenticates against the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Password,
    Key,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password => f.write_str("password"),
            AuthMethod::Key => f.write_str("key"),
        }
    }
}

/// SSH target hosting a site's stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub ip: IpAddr,
    pub port: u16,
    pub username: String,
    pub auth_method: AuthMethod,
    pub password: Option<Secret>,
    pub private_key: Option<Secret>,
}

impl Server {
    pub const DEFAULT_PORT: u16 = 22;

    /// `ip:port`, bracketing IPv6 addresses.
    pub fn address(&self) -> String {
        match self.ip {
            IpAddr::V4(ip) => format!("{}:{}", ip, self.port),
            IpAddr::V6(ip) => format!("[{}]:{}", ip, self.port),
        }
    }
}

/// MySQL credentials generated for a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub name: String,
    pub username: String,
    pub password: Secret,
}

impl DatabaseInfo {
    /// Derive names from the domain and draw a fresh random password.
    pub fn generate(domain: &str) -> Self {
        Self {
            name: database_name(domain),
            username: database_username(domain),
            password: Secret::new(generate_database_password()),
        }
    }
}

/// WordPress administrator account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WpAdmin {
    pub user: String,
    pub email: String,
    pub password: Secret,
}

/// Operator-supplied configuration for creating or editing a site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub domain: String,
    pub http_port: u16,
    pub admin: WpAdmin,
    pub server: Server,
}

impl SiteConfig {
    /// Current configuration of an existing site, for partial edits.
    pub fn from_site(site: &Site) -> Self {
        Self {
            domain: site.domain.clone(),
            http_port: site.http_port,
            admin: site.admin.clone(),
            server: site.server.clone(),
        }
    }
}

/// A site ready to be persisted for the first time.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub domain: String,
    pub container_name: ContainerName,
    pub http_port: u16,
    pub admin: WpAdmin,
    pub server: Server,
    pub database: DatabaseInfo,
}

impl NewSite {
    pub fn from_config(config: SiteConfig) -> Self {
        Self {
            container_name: ContainerName::sanitize(&config.domain),
            database: DatabaseInfo::generate(&config.domain),
            domain: config.domain,
            http_port: config.http_port,
            admin: config.admin,
            server: config.server,
        }
    }
}

/// A persisted WordPress site with its server and database records.
#[derive(Debug, Clone)]
pub struct Site {
    pub id: SiteId,
    pub domain: String,
    pub container_name: ContainerName,
    pub http_port: u16,
    pub admin: WpAdmin,
    pub status: SiteStatus,
    pub last_deployed_at: Option<DateTime<Utc>>,
    pub deployment_log: Vec<LogEntry>,
    pub server: Server,
    pub database: DatabaseInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Materialize a new record as the store would on insert.
    pub fn from_new(id: SiteId, new: NewSite, now: DateTime<Utc>) -> Self {
        Self {
            id,
            domain: new.domain,
            container_name: new.container_name,
            http_port: new.http_port,
            admin: new.admin,
            status: SiteStatus::Stopped,
            last_deployed_at: None,
            deployment_log: Vec::new(),
            server: new.server,
            database: new.database,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite configuration fields, re-deriving the container name and
    /// rotating the database credential.
    pub fn apply_config(&mut self, config: SiteConfig) {
        self.container_name = ContainerName::sanitize(&config.domain);
        self.database = DatabaseInfo::generate(&config.domain);
        self.domain = config.domain;
        self.http_port = config.http_port;
        self.admin = config.admin;
        self.server = config.server;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn sample_config(domain: &str, port: u16) -> SiteConfig {
        SiteConfig {
            domain: domain.to_string(),
            http_port: port,
            admin: WpAdmin {
                user: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: Secret::new("correct-horse"),
            },
            server: Server {
                ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                port: 22,
                username: "root".to_string(),
                auth_method: AuthMethod::Password,
                password: Some(Secret::new("ssh-pass")),
                private_key: None,
            },
        }
    }

    #[test]
    fn new_site_derives_names() {
        let new = NewSite::from_config(sample_config("a.example.com", 8081));
        assert_eq!(new.container_name.as_str(), "a.example.com");
        assert_eq!(new.database.name, "wp_db_a.example.com");
        assert!(new.database.username.starts_with("wp_user_"));
    }

    #[test]
    fn apply_config_rotates_database_password() {
        let new = NewSite::from_config(sample_config("a.example.com", 8081));
        let mut site = Site::from_new(SiteId::new(1), new, Utc::now());
        let before = site.database.password.clone();

        site.apply_config(sample_config("b.example.com", 8082));

        assert_eq!(site.container_name.as_str(), "b.example.com");
        assert_eq!(site.http_port, 8082);
        assert_ne!(site.database.password, before);
        assert_eq!(site.status, SiteStatus::Stopped);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SiteStatus::Stopped,
            SiteStatus::Deploying,
            SiteStatus::Running,
            SiteStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<SiteStatus>().unwrap(), status);
        }
        assert!("paused".parse::<SiteStatus>().is_err());
    }

    #[test]
    fn status_colors() {
        assert_eq!(SiteStatus::Running.color(), "green");
        assert_eq!(SiteStatus::Deploying.color(), "yellow");
        assert_eq!(SiteStatus::Failed.color(), "red");
    }

    #[test]
    fn ipv6_address_is_bracketed() {
        let mut server = sample_config("x.com", 80).server;
        server.ip = "::1".parse().unwrap();
        assert_eq!(server.address(), "[::1]:22");
    }
}
