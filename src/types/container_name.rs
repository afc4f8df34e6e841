// ABOUTME: Sanitized container/stack names derived from site domains.
// ABOUTME: Replaces every character outside [A-Za-z0-9_.-] with an underscore.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier used for the remote stack directory and container names.
///
/// Always produced by [`ContainerName::sanitize`], so the inner string only
/// ever contains ASCII alphanumerics, `.`, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerName(String);

impl ContainerName {
    /// Derive a container name from a domain.
    ///
    /// Sanitizing an already sanitized name returns it unchanged.
    pub fn sanitize(domain: &str) -> Self {
        let sanitized = domain
            .chars()
            .map(|c| if Self::is_allowed(c) { c } else { '_' })
            .collect();
        Self(sanitized)
    }

    fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_dots_and_hyphens() {
        assert_eq!(
            ContainerName::sanitize("a.example-site.com").as_str(),
            "a.example-site.com"
        );
    }

    #[test]
    fn replaces_disallowed_characters() {
        assert_eq!(
            ContainerName::sanitize("my site/blog:8080").as_str(),
            "my_site_blog_8080"
        );
    }

    #[test]
    fn replaces_each_non_ascii_char_once() {
        assert_eq!(ContainerName::sanitize("café.fr").as_str(), "caf_.fr");
    }
}
