// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented pressdock.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

const TEMPLATE: &str = r#"# pressdock configuration
store:
  path: .pressdock/sites.json

secrets:
  # age identity used to encrypt stored credentials (created with mode 600)
  identity: .pressdock/identity.txt

remote:
  root: /opt/wordpress
  connect_timeout: 30s
  command_timeout: 5m
  # SSH host key verification: accept and remember unknown hosts
  # Set to false and pre-populate known_hosts for strict checking
  trust_first_connection: true
  # known_hosts: ~/.ssh/known_hosts
  # Also fail commands whose output mentions "error"
  output_heuristic: true

deploy:
  settle_delay: 30s

compose:
  database_image: mysql:5.7
  wordpress_image: wordpress:latest

monitor:
  token:
    env: PRESSDOCK_MONITOR_TOKEN
"#;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;
    Ok(())
}
