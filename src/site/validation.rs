// ABOUTME: Field-level validation of site configuration.
// ABOUTME: Required fields, ranges, credentials, and cross-site uniqueness of domain and port.

use super::{AuthMethod, Site, SiteConfig};
use crate::types::SiteId;
use std::fmt;
use std::net::IpAddr;

const MIN_ADMIN_PASSWORD_LEN: usize = 8;

/// One rejected field with a message suitable for a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field errors found for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl SiteConfig {
    /// Check the configuration on its own, without looking at other sites.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.domain.trim().is_empty() {
            errors.add("domain", "domain is required");
        } else if !is_host_name(&self.domain) {
            errors.add("domain", "may only contain letters, digits, '.' and '-'");
        }
        if self.http_port == 0 {
            errors.add("http_port", "must be between 1 and 65535");
        }
        if self.server.port == 0 {
            errors.add("server_port", "must be between 1 and 65535");
        }
        if self.server.username.trim().is_empty() {
            errors.add("server_username", "SSH username is required");
        }
        if self.admin.user.trim().is_empty() {
            errors.add("wp_admin_user", "admin username is required");
        }
        if !looks_like_email(&self.admin.email) {
            errors.add("wp_admin_email", "must be a valid email address");
        }
        if self.admin.password.len() < MIN_ADMIN_PASSWORD_LEN {
            errors.add(
                "wp_admin_password",
                format!("must be at least {MIN_ADMIN_PASSWORD_LEN} characters"),
            );
        }

        let has_password = self.server.password.as_ref().is_some_and(|p| !p.is_empty());
        let has_key = self
            .server
            .private_key
            .as_ref()
            .is_some_and(|k| !k.is_empty());
        if !has_password && !has_key {
            let field = match self.server.auth_method {
                AuthMethod::Password => "ssh_password",
                AuthMethod::Key => "ssh_private_key",
            };
            errors.add(field, "an SSH password or private key is required");
        }

        errors.into_result()
    }
}

/// Alphanumerics, `.` and `-` only, so a valid domain is never changed by
/// [`ContainerName::sanitize`](crate::types::ContainerName::sanitize).
fn is_host_name(value: &str) -> bool {
    value.len() <= 253
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Reject a domain already used by another site, or an HTTP port another site
/// already claims on the same server.
///
/// `own_id` excludes the record being edited from the comparison.
pub fn check_conflicts<'a>(
    own_id: Option<SiteId>,
    domain: &str,
    server_ip: IpAddr,
    http_port: u16,
    existing: impl IntoIterator<Item = &'a Site>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for other in existing {
        if Some(other.id) == own_id {
            continue;
        }
        if other.domain == domain && !errors.has("domain") {
            errors.add("domain", "the domain has already been taken");
        }
        if other.server.ip == server_ip && other.http_port == http_port && !errors.has("http_port")
        {
            errors.add(
                "http_port",
                format!("port {http_port} is already used by {} on this server", other.domain),
            );
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{NewSite, Server, WpAdmin};
    use crate::types::Secret;
    use chrono::Utc;

    fn config() -> SiteConfig {
        SiteConfig {
            domain: "a.example.com".to_string(),
            http_port: 8081,
            admin: WpAdmin {
                user: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: Secret::new("longenough"),
            },
            server: Server {
                ip: "10.0.0.5".parse().unwrap(),
                port: 22,
                username: "root".to_string(),
                auth_method: AuthMethod::Password,
                password: Some(Secret::new("pw")),
                private_key: None,
            },
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn collects_every_field_error() {
        let mut cfg = config();
        cfg.domain = " ".to_string();
        cfg.http_port = 0;
        cfg.admin.email = "not-an-email".to_string();
        cfg.admin.password = Secret::new("short");

        let errors = cfg.validate().unwrap_err();
        assert!(errors.has("domain"));
        assert!(errors.has("http_port"));
        assert!(errors.has("wp_admin_email"));
        assert!(errors.has("wp_admin_password"));
        assert_eq!(errors.fields().len(), 4);
    }

    #[test]
    fn domain_must_be_a_host_name() {
        let mut cfg = config();
        cfg.domain = "a.example.com; rm -rf /".to_string();
        assert!(cfg.validate().unwrap_err().has("domain"));
    }

    #[test]
    fn domains_the_sanitizer_would_rewrite_are_rejected() {
        for domain in ["my_site.com", "café.fr", "a b.com"] {
            let mut cfg = config();
            cfg.domain = domain.to_string();
            assert!(cfg.validate().unwrap_err().has("domain"), "{domain}");
        }
    }

    #[test]
    fn requires_some_ssh_credential() {
        let mut cfg = config();
        cfg.server.password = None;
        cfg.server.auth_method = AuthMethod::Key;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.has("ssh_private_key"));
    }

    #[test]
    fn port_conflict_on_same_server() {
        let existing = Site::from_new(
            SiteId::new(1),
            NewSite::from_config(config()),
            Utc::now(),
        );

        let result = check_conflicts(
            None,
            "b.example.com",
            "10.0.0.5".parse().unwrap(),
            8081,
            [&existing],
        );
        assert!(result.unwrap_err().has("http_port"));

        // same port on another server is fine
        let result = check_conflicts(
            None,
            "b.example.com",
            "10.0.0.6".parse().unwrap(),
            8081,
            [&existing],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn editing_a_site_does_not_conflict_with_itself() {
        let existing = Site::from_new(
            SiteId::new(1),
            NewSite::from_config(config()),
            Utc::now(),
        );
        let result = check_conflicts(
            Some(SiteId::new(1)),
            "a.example.com",
            "10.0.0.5".parse().unwrap(),
            8081,
            [&existing],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn duplicate_domain_rejected() {
        let existing = Site::from_new(
            SiteId::new(1),
            NewSite::from_config(config()),
            Utc::now(),
        );
        let result = check_conflicts(
            None,
            "a.example.com",
            "10.0.0.9".parse().unwrap(),
            9000,
            [&existing],
        );
        assert!(result.unwrap_err().has("domain"));
    }
}
