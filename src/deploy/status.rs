// ABOUTME: Inbound status reports from external monitors.
// ABOUTME: Token check and the report payload applied directly to a site's status.

use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::site::SiteStatus;
use crate::types::Secret;

/// A monitor's claim about a site's current state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub domain: String,
    pub status: SiteStatus,
    pub container_name: String,
}

/// Compare a presented bearer token against the configured one.
///
/// Without a configured token every report is refused. Equal-length tokens
/// are compared in constant time.
pub fn token_matches(expected: Option<&Secret>, provided: &str) -> bool {
    let Some(expected) = expected.filter(|t| !t.is_empty()) else {
        return false;
    };
    expected
        .expose()
        .as_bytes()
        .ct_eq(provided.as_bytes())
        .into()
}
