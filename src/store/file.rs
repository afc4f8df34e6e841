// ABOUTME: JSON file-backed site store with age-sealed credentials.
// ABOUTME: Loads the whole table on open and rewrites it atomically after every change.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::error::{DecodeSnafu, EncodeSnafu, IoSnafu};
use super::records::SiteRecords;
use super::vault::Vault;
use super::{Page, Paginated, SiteStore, StoreError};
use crate::site::{AuthMethod, DatabaseInfo, NewSite, Server, Site, SiteStatus, WpAdmin};
use crate::transcript::LogEntry;
use crate::types::{ContainerName, SiteId};

/// Site store persisted as a single JSON document.
///
/// Passwords and private keys never reach the file in plaintext; they are
/// sealed with the [`Vault`] identity.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    vault: Vault,
    records: Mutex<SiteRecords>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredFile {
    next_id: u64,
    sites: Vec<StoredSite>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSite {
    id: SiteId,
    domain: String,
    container_name: ContainerName,
    http_port: u16,
    status: SiteStatus,
    last_deployed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    deployment_log: Vec<LogEntry>,
    admin: StoredAdmin,
    server: StoredServer,
    database: StoredDatabase,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAdmin {
    user: String,
    email: String,
    password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredServer {
    ip: IpAddr,
    port: u16,
    username: String,
    auth_method: AuthMethod,
    password: Option<String>,
    private_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredDatabase {
    name: String,
    username: String,
    password: String,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>, vault: Vault) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: StoredFile =
                    serde_json::from_slice(&bytes).context(DecodeSnafu { path: &path })?;
                unseal_records(file, &vault)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SiteRecords::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), sites = records.sites.len(), "opened site store");
        Ok(Self {
            path,
            vault,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the table to a sibling temp file, then rename over the original.
    async fn persist(&self, records: &SiteRecords) -> Result<(), StoreError> {
        let file = seal_records(records, &self.vault)?;
        let json = serde_json::to_vec_pretty(&file).context(EncodeSnafu)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .context(IoSnafu { path: parent })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .context(IoSnafu { path: &tmp })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .context(IoSnafu { path: &self.path })?;
        Ok(())
    }

    /// Apply `change` to a copy of the table and keep it only if it persists.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut SiteRecords) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        let value = change(&mut next)?;
        self.persist(&next).await?;
        *records = next;
        Ok(value)
    }
}

#[async_trait]
impl SiteStore for FileStore {
    async fn create(&self, new: NewSite) -> Result<Site, StoreError> {
        self.mutate(|records| records.insert(new)).await
    }

    async fn find(&self, id: SiteId) -> Result<Site, StoreError> {
        self.records.lock().await.get(id)
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Site>, StoreError> {
        Ok(self.records.lock().await.by_domain(domain))
    }

    async fn update(&self, site: &Site) -> Result<Site, StoreError> {
        self.mutate(|records| records.replace(site)).await
    }

    async fn delete(&self, id: SiteId) -> Result<(), StoreError> {
        self.mutate(|records| records.remove(id)).await
    }

    async fn list(&self, page: Page) -> Result<Paginated<Site>, StoreError> {
        Ok(self.records.lock().await.page(page))
    }
}

fn seal_records(records: &SiteRecords, vault: &Vault) -> Result<StoredFile, StoreError> {
    let sites = records
        .sites
        .values()
        .map(|site| seal_site(site, vault))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StoredFile {
        next_id: records.next_id,
        sites,
    })
}

fn seal_site(site: &Site, vault: &Vault) -> Result<StoredSite, StoreError> {
    let server = &site.server;
    Ok(StoredSite {
        id: site.id,
        domain: site.domain.clone(),
        container_name: site.container_name.clone(),
        http_port: site.http_port,
        status: site.status,
        last_deployed_at: site.last_deployed_at,
        deployment_log: site.deployment_log.clone(),
        admin: StoredAdmin {
            user: site.admin.user.clone(),
            email: site.admin.email.clone(),
            password: vault.seal(&site.admin.password)?,
        },
        server: StoredServer {
            ip: server.ip,
            port: server.port,
            username: server.username.clone(),
            auth_method: server.auth_method,
            password: server.password.as_ref().map(|p| vault.seal(p)).transpose()?,
            private_key: server
                .private_key
                .as_ref()
                .map(|k| vault.seal(k))
                .transpose()?,
        },
        database: StoredDatabase {
            name: site.database.name.clone(),
            username: site.database.username.clone(),
            password: vault.seal(&site.database.password)?,
        },
        created_at: site.created_at,
        updated_at: site.updated_at,
    })
}

fn unseal_records(file: StoredFile, vault: &Vault) -> Result<SiteRecords, StoreError> {
    let mut sites = BTreeMap::new();
    for stored in file.sites {
        let site = unseal_site(stored, vault)?;
        sites.insert(site.id, site);
    }
    let highest = sites.keys().next_back().map_or(0, |id| id.get());
    Ok(SiteRecords {
        next_id: file.next_id.max(highest + 1),
        sites,
    })
}

fn unseal_site(stored: StoredSite, vault: &Vault) -> Result<Site, StoreError> {
    let server = stored.server;
    Ok(Site {
        id: stored.id,
        domain: stored.domain,
        container_name: stored.container_name,
        http_port: stored.http_port,
        admin: WpAdmin {
            user: stored.admin.user,
            email: stored.admin.email,
            password: vault.open(&stored.admin.password)?,
        },
        status: stored.status,
        last_deployed_at: stored.last_deployed_at,
        deployment_log: stored.deployment_log,
        server: Server {
            ip: server.ip,
            port: server.port,
            username: server.username,
            auth_method: server.auth_method,
            password: server.password.map(|p| vault.open(&p)).transpose()?,
            private_key: server.private_key.map(|k| vault.open(&k)).transpose()?,
        },
        database: DatabaseInfo {
            name: stored.database.name,
            username: stored.database.username,
            password: vault.open(&stored.database.password)?,
        },
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    })
}
