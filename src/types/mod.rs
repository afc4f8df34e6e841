// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Site identifiers, sanitized container names, and redacting secrets.

mod container_name;
mod id;
mod secret;

pub use container_name::ContainerName;
pub use id::{ParseSiteIdError, SiteId};
pub use secret::Secret;
