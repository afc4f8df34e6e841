// ABOUTME: Site lifecycle state machine: create, deploy, update, stop, delete.
// ABOUTME: Drives the remote executor, records a fresh transcript per call, persists outcomes.

use chrono::Utc;
use std::time::Duration;

use super::error::DeployError;
use super::lock::SiteLocks;
use super::status::StatusReport;
use crate::compose::{self, ComposeInput, Images};
use crate::remote::{Executor, RemoteCommand, RemoteLayout, drop_database, settle};
use crate::site::{NewSite, Site, SiteConfig, SiteStatus};
use crate::ssh::Connector;
use crate::store::SiteStore;
use crate::transcript::DeploymentLog;
use crate::types::{ContainerName, SiteId};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(30);

/// Remote-side settings shared by every operation.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub layout: RemoteLayout,
    /// Wait after `docker-compose up -d` before declaring success.
    pub settle_delay: Duration,
    pub images: Images,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            layout: RemoteLayout::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            images: Images::default(),
        }
    }
}

/// Fields restored when an update fails.
#[derive(Debug, Clone)]
struct RollbackPoint {
    domain: String,
    container_name: ContainerName,
    http_port: u16,
}

impl RollbackPoint {
    fn capture(site: &Site) -> Self {
        Self {
            domain: site.domain.clone(),
            container_name: site.container_name.clone(),
            http_port: site.http_port,
        }
    }

    fn restore(self, site: &mut Site) {
        site.domain = self.domain;
        site.container_name = self.container_name;
        site.http_port = self.http_port;
    }
}

/// Orchestrates remote WordPress stacks for the sites in a store.
///
/// Every operation starts a new [`DeploymentLog`] and persists it on the site
/// before returning, on success and on failure. Operations on the same site
/// are serialized.
#[derive(Debug)]
pub struct Orchestrator<S, C> {
    store: S,
    executor: Executor<C>,
    settings: DeploySettings,
    locks: SiteLocks,
}

impl<S: SiteStore, C: Connector> Orchestrator<S, C> {
    pub fn new(store: S, executor: Executor<C>, settings: DeploySettings) -> Self {
        Self {
            store,
            executor,
            settings,
            locks: SiteLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &SiteLocks {
        &self.locks
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    /// Persist a new site and deploy it.
    ///
    /// Invalid or conflicting configuration is rejected before anything is
    /// stored. Once stored, the record is kept even if deployment fails.
    pub async fn create(&self, config: SiteConfig) -> Result<Site, DeployError> {
        config.validate()?;

        let mut log = DeploymentLog::new();
        let new = NewSite::from_config(config);
        log.info(format!("Generated container name: {}", new.container_name));

        let mut site = self.store.create(new).await?;
        let _lock = self.locks.lock(site.id).await;
        tracing::debug!(site = %site.id, domain = %site.domain, "site created");

        log.info("Starting deployment process...");
        let result = match self.run_deploy(&mut site, None, &mut log).await {
            Ok(()) => {
                log.success("WordPress site created and deployed successfully!");
                Ok(())
            }
            Err(e) => {
                log.error(format!("Site creation failed: {e}"));
                site.status = SiteStatus::Failed;
                Err(e)
            }
        };
        self.finish(&mut site, &mut log, result).await.map(|()| site)
    }

    /// Bring the site's stack up on its server.
    pub async fn deploy(&self, id: SiteId) -> Result<Site, DeployError> {
        let _lock = self.locks.lock(id).await;
        let mut site = self.store.find(id).await?;
        let mut log = DeploymentLog::new();

        self.run_deploy(&mut site, None, &mut log).await?;
        Ok(site)
    }

    /// Apply new configuration and redeploy under it.
    ///
    /// When anything after the configuration write fails, the previous domain,
    /// container name and HTTP port are written back and the site is marked
    /// failed. Other fields keep their new values. If the restored values
    /// cannot be written, the new ones stay stored and the transcript says so.
    pub async fn update(&self, id: SiteId, config: SiteConfig) -> Result<Site, DeployError> {
        config.validate()?;

        let _lock = self.locks.lock(id).await;
        let current = self.store.find(id).await?;
        let mut log = DeploymentLog::new();
        let rollback = RollbackPoint::capture(&current);

        log.info(format!("Updating site: {}", current.id));
        log.info(format!(
            "Old container name: {}, old HTTP port: {}",
            rollback.container_name, rollback.http_port
        ));

        log.info("Updating database fields...");
        let mut edited = current;
        edited.apply_config(config);
        edited.deployment_log = log.snapshot();
        let mut site = self.store.update(&edited).await?;
        log.success("Site database updated");

        match self.redeploy(&mut site, &rollback, &mut log).await {
            Ok(()) => {
                log.success("Redeployment completed successfully");
                self.finish(&mut site, &mut log, Ok(())).await.map(|()| site)
            }
            Err(e) => {
                log.error(format!("Update failed: {e}"));
                log.info("Rolling back site configuration...");
                self.roll_back(site, rollback, log, e).await
            }
        }
    }

    /// Take the stack down, keeping its volumes.
    ///
    /// A failed stop marks the site failed.
    pub async fn stop(&self, id: SiteId) -> Result<Site, DeployError> {
        let _lock = self.locks.lock(id).await;
        let mut site = self.store.find(id).await?;
        let mut log = DeploymentLog::new();

        log.info(format!("Stopping site: {}", site.domain));
        let command = self.settings.layout.compose_down(&site.container_name);
        let result = self.run_session(&site, &[command], &mut log).await;

        match &result {
            Ok(()) => {
                site.status = SiteStatus::Stopped;
                log.success(format!("Site {} stopped", site.domain));
            }
            Err(e) => {
                site.status = SiteStatus::Failed;
                log.error(format!("Stop failed for {}: {e}", site.container_name));
            }
        }

        self.finish(&mut site, &mut log, result).await.map(|()| site)
    }

    /// Remove the remote stack and database when reachable, then the record.
    ///
    /// Remote cleanup is best effort. The record is removed even when the
    /// server cannot be reached. Returns the transcript, since the record it
    /// would have been stored on is gone.
    pub async fn delete(&self, id: SiteId) -> Result<DeploymentLog, DeployError> {
        let lock = self.locks.lock(id).await;
        let site = self.store.find(id).await?;
        let mut log = DeploymentLog::new();

        log.info(format!("Deleting site: {}", site.domain));
        match self.executor.connect(&site.server, &mut log).await {
            Ok(shell) => {
                let layout = &self.settings.layout;
                if let Err(e) = self
                    .executor
                    .run(&shell, &layout.remove_stack(&site.container_name), &mut log)
                    .await
                {
                    log.warning(format!("Remote stack cleanup failed: {e}"));
                }
                if let Err(e) = self
                    .executor
                    .run(&shell, &drop_database(&site.database.name), &mut log)
                    .await
                {
                    log.warning(format!("Database cleanup failed: {e}"));
                }
                self.executor.disconnect(shell, &mut log).await;
            }
            Err(e) => {
                log.warning(format!("Skipping remote cleanup, server unreachable: {e}"));
            }
        }

        self.store.delete(id).await?;
        log.success(format!("Site {} deleted", site.domain));

        drop(lock);
        self.locks.forget(id);
        Ok(log)
    }

    /// Apply a monitor's status report directly to the site.
    ///
    /// Reports are refused with [`DeployError::Busy`] while an operation holds
    /// the site, so they never overwrite an in-flight transition.
    pub async fn report_status(&self, report: StatusReport) -> Result<Site, DeployError> {
        let found = self
            .store
            .find_by_domain(&report.domain)
            .await?
            .ok_or_else(|| DeployError::DomainNotFound(report.domain.clone()))?;

        let Some(_lock) = self.locks.try_lock(found.id) else {
            tracing::warn!(
                site = %found.id,
                status = %report.status,
                "status report refused, site busy"
            );
            return Err(DeployError::Busy(found.id));
        };

        let mut site = self.store.find(found.id).await?;
        if site.container_name.as_str() != report.container_name {
            tracing::warn!(
                site = %site.id,
                expected = %site.container_name,
                reported = %report.container_name,
                "status report names a different container"
            );
        }

        site.status = report.status;
        let site = self.store.update(&site).await?;
        tracing::info!(
            domain = %site.domain,
            status = %site.status,
            "site status updated by monitor"
        );
        Ok(site)
    }

    /// Mark deploying, deploy, and persist the outcome.
    ///
    /// `prior` is a session opened by an earlier phase; it is closed before
    /// the deploy opens its own.
    async fn run_deploy(
        &self,
        site: &mut Site,
        prior: Option<C::Shell>,
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        site.status = SiteStatus::Deploying;
        if let Err(e) = self.persist(site, log).await {
            if let Some(shell) = prior {
                self.executor.disconnect(shell, log).await;
            }
            return Err(e);
        }

        log.info(format!("Connecting to server: {}", site.server.address()));
        let result = self.deploy_stack(site, prior, log).await;

        match &result {
            Ok(()) => {
                site.status = SiteStatus::Running;
                site.last_deployed_at = Some(Utc::now());
                log.success("WordPress deployment completed successfully");
            }
            Err(e) => {
                site.status = SiteStatus::Failed;
                log.error(format!("Deployment failed: {e}"));
            }
        }

        self.finish(site, log, result).await
    }

    async fn deploy_stack(
        &self,
        site: &Site,
        prior: Option<C::Shell>,
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        log.info(format!(
            "Starting WordPress deployment for container: {}",
            site.container_name
        ));
        if let Some(shell) = prior {
            log.info("Disconnecting any existing SSH connection");
            self.executor.disconnect(shell, log).await;
        }

        let shell = self.executor.connect(&site.server, log).await?;
        let outcome = self.deploy_on(&shell, site, log).await;
        self.executor.disconnect(shell, log).await;
        outcome
    }

    async fn deploy_on(
        &self,
        shell: &C::Shell,
        site: &Site,
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        log.info(format!(
            "Generating docker-compose.yml for {}",
            site.container_name
        ));
        let descriptor = compose::render(ComposeInput::from_site(site), &self.settings.images)?;
        log.success("docker-compose.yml generated successfully");

        let layout = &self.settings.layout;
        let name = &site.container_name;
        let commands = [
            layout.make_dir(name),
            layout.write_compose(name, &descriptor),
            layout.compose_up(name),
            settle(self.settings.settle_delay),
        ];
        self.run_all(shell, &commands, log).await
    }

    /// Connect, remove the old stack with its volumes, rename its directory
    /// if the name changed, then deploy with the session handed over.
    async fn redeploy(
        &self,
        site: &mut Site,
        previous: &RollbackPoint,
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        log.info("Attempting SSH connection for update...");
        let shell = self.executor.connect(&site.server, log).await?;

        let layout = &self.settings.layout;
        let mut commands = vec![layout.remove_stack_if_present(&previous.container_name)];
        if previous.container_name != site.container_name {
            log.info(format!(
                "Domain changed, renaming directory: {} -> {}",
                previous.container_name, site.container_name
            ));
            commands.push(layout.rename(&previous.container_name, &site.container_name));
        }

        log.info("Removing existing WordPress stack...");
        if let Err(e) = self.run_all(&shell, &commands, log).await {
            self.executor.disconnect(shell, log).await;
            return Err(e);
        }
        log.success("Existing stack removed");

        log.info("Starting redeployment for updated site...");
        self.run_deploy(site, Some(shell), log).await
    }

    /// Write the rollback point back and mark the site failed.
    ///
    /// When that write is rejected the site keeps its new values, marked
    /// failed, with the rejection in its transcript. Always returns `error`.
    async fn roll_back(
        &self,
        site: Site,
        rollback: RollbackPoint,
        mut log: DeploymentLog,
        error: DeployError,
    ) -> Result<Site, DeployError> {
        let mut restored = site.clone();
        rollback.restore(&mut restored);
        restored.status = SiteStatus::Failed;
        let Err(persist) = self.persist(&mut restored, &log).await else {
            return Err(error);
        };

        tracing::error!(site = %site.id, error = %persist, "rollback could not be saved");
        log.error(format!("Rollback could not be saved: {persist}"));
        let mut kept = site;
        kept.status = SiteStatus::Failed;
        self.finish(&mut kept, &mut log, Err(error)).await.map(|()| kept)
    }

    /// Connect, run `commands`, and always disconnect.
    async fn run_session(
        &self,
        site: &Site,
        commands: &[RemoteCommand],
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        let shell = self.executor.connect(&site.server, log).await?;
        let outcome = self.run_all(&shell, commands, log).await;
        self.executor.disconnect(shell, log).await;
        outcome
    }

    async fn run_all(
        &self,
        shell: &C::Shell,
        commands: &[RemoteCommand],
        log: &mut DeploymentLog,
    ) -> Result<(), DeployError> {
        for command in commands {
            self.executor.run(shell, command, log).await?;
        }
        Ok(())
    }

    async fn persist(&self, site: &mut Site, log: &DeploymentLog) -> Result<(), DeployError> {
        site.deployment_log = log.snapshot();
        *site = self.store.update(site).await?;
        Ok(())
    }

    /// Persist the transcript, preferring the operation's own error over a
    /// failure to save it. A failed save is recorded in `log` so a later
    /// write carries it.
    async fn finish(
        &self,
        site: &mut Site,
        log: &mut DeploymentLog,
        result: Result<(), DeployError>,
    ) -> Result<(), DeployError> {
        let persisted = self.persist(site, log).await;
        if let Err(persist) = &persisted {
            tracing::error!(site = %site.id, error = %persist, "failed to persist transcript");
            log.error(format!("Failed to save site state: {persist}"));
        }
        match (result, persisted) {
            (Ok(()), persisted) => persisted,
            (Err(e), _) => Err(e),
        }
    }
}
