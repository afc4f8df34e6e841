// ABOUTME: Command module aggregator for the pressdock CLI.
// ABOUTME: Builds the orchestrator from configuration and re-exports command handlers.

mod sites;
mod status;

pub use sites::{create, delete, deploy, list, logs, stop, update};
pub use status::report_status;

use pressdock::config::Config;
use pressdock::deploy::Orchestrator;
use pressdock::error::Result;
use pressdock::remote::Executor;
use pressdock::ssh::SshConnector;
use pressdock::store::{FileStore, Vault};

pub type AppOrchestrator = Orchestrator<FileStore, SshConnector>;

/// Open the site store and wire it to the SSH transport.
pub async fn orchestrator(config: &Config) -> Result<AppOrchestrator> {
    let vault = Vault::load_or_create(&config.identity_path())?;
    let store = FileStore::open(config.store_path(), vault).await?;
    let executor = Executor::new(SshConnector::new(config.ssh_settings()))
        .output_heuristic(config.remote.output_heuristic);
    Ok(Orchestrator::new(store, executor, config.deploy_settings()))
}
