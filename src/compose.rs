// ABOUTME: Renders the Docker Compose descriptor for a WordPress site.
// ABOUTME: Two services (MySQL and WordPress) on a private bridge network with named volumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::site::{DatabaseInfo, Site};
use crate::types::ContainerName;

pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";
pub const COMPOSE_VERSION: &str = "3.8";

const NETWORK: &str = "wordpress_network";
const DB_VOLUME: &str = "db_data";
const WP_VOLUME: &str = "wp_data";
const DB_SERVICE: &str = "database";
const WP_SERVICE: &str = "wordpress";
const RESTART: &str = "unless-stopped";

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to render compose file: {0}")]
    Render(#[from] serde_yaml::Error),
}

/// Container images used by the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub database_image: String,
    pub wordpress_image: String,
}

impl Default for Images {
    fn default() -> Self {
        Self {
            database_image: "mysql:5.7".to_string(),
            wordpress_image: "wordpress:latest".to_string(),
        }
    }
}

/// Everything the descriptor depends on.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub container_name: &'a ContainerName,
    pub http_port: u16,
    pub database: &'a DatabaseInfo,
}

impl<'a> ComposeInput<'a> {
    pub fn from_site(site: &'a Site) -> Self {
        Self {
            container_name: &site.container_name,
            http_port: site.http_port,
            database: &site.database,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ComposeFile {
    pub version: String,
    pub services: BTreeMap<String, Service>,
    pub volumes: BTreeMap<String, Option<Volume>>,
    pub networks: BTreeMap<String, Network>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub image: String,
    pub container_name: String,
    pub restart: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortMapping>,
    pub environment: BTreeMap<String, String>,
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub networks: Vec<String>,
}

/// Long-form port mapping, which avoids YAML reading `8081:80` as a number.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PortMapping {
    pub target: u16,
    pub published: u16,
    pub protocol: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Volume {}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Network {
    pub driver: String,
}

/// Build the descriptor structure.
pub fn build(input: ComposeInput<'_>, images: &Images) -> ComposeFile {
    let name = input.container_name.as_str();
    let db = input.database;
    let network = vec![NETWORK.to_string()];

    let database = Service {
        image: images.database_image.clone(),
        container_name: name.to_string(),
        restart: RESTART.to_string(),
        ports: Vec::new(),
        environment: BTreeMap::from([
            ("MYSQL_DATABASE".to_string(), db.name.clone()),
            ("MYSQL_USER".to_string(), db.username.clone()),
            ("MYSQL_PASSWORD".to_string(), db.password.expose().to_string()),
            ("MYSQL_RANDOM_ROOT_PASSWORD".to_string(), "1".to_string()),
        ]),
        volumes: vec![format!("{DB_VOLUME}:/var/lib/mysql")],
        depends_on: Vec::new(),
        networks: network.clone(),
    };

    let wordpress = Service {
        image: images.wordpress_image.clone(),
        container_name: format!("wp_{name}"),
        restart: RESTART.to_string(),
        ports: vec![PortMapping {
            target: 80,
            published: input.http_port,
            protocol: "tcp".to_string(),
        }],
        environment: BTreeMap::from([
            ("WORDPRESS_DB_HOST".to_string(), format!("{DB_SERVICE}:3306")),
            ("WORDPRESS_DB_USER".to_string(), db.username.clone()),
            ("WORDPRESS_DB_PASSWORD".to_string(), db.password.expose().to_string()),
            ("WORDPRESS_DB_NAME".to_string(), db.name.clone()),
        ]),
        volumes: vec![format!("{WP_VOLUME}:/var/www/html")],
        depends_on: vec![DB_SERVICE.to_string()],
        networks: network,
    };

    ComposeFile {
        version: COMPOSE_VERSION.to_string(),
        services: BTreeMap::from([
            (DB_SERVICE.to_string(), database),
            (WP_SERVICE.to_string(), wordpress),
        ]),
        volumes: BTreeMap::from([(DB_VOLUME.to_string(), None), (WP_VOLUME.to_string(), None)]),
        networks: BTreeMap::from([(
            NETWORK.to_string(),
            Network {
                driver: "bridge".to_string(),
            },
        )]),
    }
}

/// Render the descriptor as YAML text. Deterministic for equal inputs.
pub fn render(input: ComposeInput<'_>, images: &Images) -> Result<String, Error> {
    Ok(serde_yaml::to_string(&build(input, images))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Secret;

    fn database() -> DatabaseInfo {
        DatabaseInfo {
            name: "wp_db_a.example.com".to_string(),
            username: "wp_user_1234abcd".to_string(),
            password: Secret::new("00ff00ff00ff00ff00ff00ff00ff00ff"),
        }
    }

    #[test]
    fn render_is_deterministic() {
        let name = ContainerName::sanitize("a.example.com");
        let db = database();
        let input = ComposeInput {
            container_name: &name,
            http_port: 8081,
            database: &db,
        };
        let images = Images::default();
        assert_eq!(
            render(input, &images).unwrap(),
            render(input, &images).unwrap()
        );
    }

    #[test]
    fn wordpress_points_at_database_service() {
        let name = ContainerName::sanitize("a.example.com");
        let db = database();
        let file = build(
            ComposeInput {
                container_name: &name,
                http_port: 8081,
                database: &db,
            },
            &Images::default(),
        );

        let wp = &file.services["wordpress"];
        assert_eq!(wp.container_name, "wp_a.example.com");
        assert_eq!(wp.environment["WORDPRESS_DB_HOST"], "database:3306");
        assert_eq!(wp.depends_on, vec!["database"]);
        assert_eq!(wp.ports[0].published, 8081);
        assert_eq!(wp.ports[0].target, 80);

        let mysql = &file.services["database"];
        assert_eq!(mysql.image, "mysql:5.7");
        assert_eq!(mysql.container_name, "a.example.com");
        assert_eq!(mysql.environment["MYSQL_RANDOM_ROOT_PASSWORD"], "1");
        assert!(mysql.ports.is_empty());
    }
}
