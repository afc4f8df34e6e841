// ABOUTME: Site lifecycle commands: create, update, deploy, stop, delete, list, logs.
// ABOUTME: Translate CLI arguments into orchestrator calls and print the outcome.

use std::path::Path;

use super::AppOrchestrator;
use crate::cli::{CreateArgs, UpdateArgs};
use pressdock::error::{Error, Result};
use pressdock::output::Output;
use pressdock::site::{AuthMethod, Server, SiteConfig, WpAdmin};
use pressdock::store::{Page, SiteStore};
use pressdock::types::{Secret, SiteId};

fn read_key(path: &Path) -> Result<Secret> {
    let pem = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("cannot read SSH key {}: {e}", path.display()))
    })?;
    Ok(Secret::new(pem))
}

fn site_config(args: CreateArgs) -> Result<SiteConfig> {
    let private_key = args.ssh_key_file.as_deref().map(read_key).transpose()?;
    Ok(SiteConfig {
        domain: args.domain,
        http_port: args.http_port,
        admin: WpAdmin {
            user: args.admin_user,
            email: args.admin_email,
            password: Secret::new(args.admin_password),
        },
        server: Server {
            ip: args.server_ip,
            port: args.ssh_port,
            username: args.ssh_user,
            auth_method: AuthMethod::from(args.auth_method),
            password: args.ssh_password.map(Secret::new),
            private_key,
        },
    })
}

fn apply_changes(mut config: SiteConfig, changes: UpdateArgs) -> Result<SiteConfig> {
    if let Some(domain) = changes.domain {
        config.domain = domain;
    }
    if let Some(port) = changes.http_port {
        config.http_port = port;
    }
    if let Some(ip) = changes.server_ip {
        config.server.ip = ip;
    }
    if let Some(port) = changes.ssh_port {
        config.server.port = port;
    }
    if let Some(user) = changes.ssh_user {
        config.server.username = user;
    }
    if let Some(method) = changes.auth_method {
        config.server.auth_method = method.into();
    }
    if let Some(password) = changes.ssh_password {
        config.server.password = Some(Secret::new(password));
    }
    if let Some(path) = changes.ssh_key_file {
        config.server.private_key = Some(read_key(&path)?);
    }
    if let Some(user) = changes.admin_user {
        config.admin.user = user;
    }
    if let Some(email) = changes.admin_email {
        config.admin.email = email;
    }
    if let Some(password) = changes.admin_password {
        config.admin.password = Secret::new(password);
    }
    Ok(config)
}

/// Print the stored transcript of a site after a failed operation.
async fn show_failure(orchestrator: &AppOrchestrator, id: SiteId, output: &Output) {
    if let Ok(site) = orchestrator.store().find(id).await {
        output.transcript(&site.deployment_log);
    }
}

pub async fn create(
    orchestrator: &AppOrchestrator,
    args: CreateArgs,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let config = site_config(args)?;
    let domain = config.domain.clone();
    output.progress(&format!("Creating {domain}..."));

    match orchestrator.create(config).await {
        Ok(site) => {
            output.transcript(&site.deployment_log);
            output.site(&format!("Site {} deployed", site.domain), &site);
            Ok(())
        }
        Err(e) => {
            if let Ok(Some(site)) = orchestrator.store().find_by_domain(&domain).await {
                output.transcript(&site.deployment_log);
            }
            Err(e.into())
        }
    }
}

pub async fn update(
    orchestrator: &AppOrchestrator,
    id: SiteId,
    changes: UpdateArgs,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let current = orchestrator.store().find(id).await?;
    let config = apply_changes(SiteConfig::from_site(&current), changes)?;
    output.progress(&format!("Updating site {id}..."));

    match orchestrator.update(id, config).await {
        Ok(site) => {
            output.transcript(&site.deployment_log);
            output.site(&format!("Site {} updated", site.domain), &site);
            Ok(())
        }
        Err(e) => {
            show_failure(orchestrator, id, &output).await;
            Err(e.into())
        }
    }
}

pub async fn deploy(orchestrator: &AppOrchestrator, id: SiteId, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Deploying site {id}..."));

    match orchestrator.deploy(id).await {
        Ok(site) => {
            output.transcript(&site.deployment_log);
            output.site(&format!("Site {} deployed", site.domain), &site);
            Ok(())
        }
        Err(e) => {
            show_failure(orchestrator, id, &output).await;
            Err(e.into())
        }
    }
}

pub async fn stop(orchestrator: &AppOrchestrator, id: SiteId, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Stopping site {id}..."));

    match orchestrator.stop(id).await {
        Ok(site) => {
            output.transcript(&site.deployment_log);
            output.site(&format!("Site {} stopped", site.domain), &site);
            Ok(())
        }
        Err(e) => {
            show_failure(orchestrator, id, &output).await;
            Err(e.into())
        }
    }
}

pub async fn delete(orchestrator: &AppOrchestrator, id: SiteId, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!("Deleting site {id}..."));

    let log = orchestrator.delete(id).await?;
    output.transcript(log.entries());
    if log.entries().iter().any(|e| e.severity == pressdock::transcript::Severity::Warning) {
        output.warning("remote cleanup was incomplete, see transcript");
    }
    output.success(&format!("Site {id} deleted"));
    Ok(())
}

pub async fn list(orchestrator: &AppOrchestrator, page: Page, output: Output) -> Result<()> {
    let sites = orchestrator.store().list(page).await?;
    output.sites(&sites);
    Ok(())
}

pub async fn logs(orchestrator: &AppOrchestrator, id: SiteId, output: Output) -> Result<()> {
    let site = orchestrator.store().find(id).await?;
    if site.deployment_log.is_empty() {
        output.progress("No transcript recorded yet.");
    }
    output.transcript(&site.deployment_log);
    Ok(())
}
