// ABOUTME: Deployment orchestration for WordPress sites.
// ABOUTME: Exports the orchestrator, its error taxonomy, per-site locks, and status reports.

mod error;
mod lock;
mod orchestrator;
mod status;

pub use error::{DeployError, DeployErrorKind};
pub use lock::{SiteLock, SiteLocks};
pub use orchestrator::{DEFAULT_SETTLE_DELAY, DeploySettings, Orchestrator};
pub use status::{StatusReport, token_matches};
