// ABOUTME: Status report command for external monitors.
// ABOUTME: Checks the shared token, then applies the reported status to the site.

use super::AppOrchestrator;
use pressdock::config::Config;
use pressdock::deploy::{StatusReport, token_matches};
use pressdock::error::{Error, Result};
use pressdock::output::Output;

pub async fn report_status(
    orchestrator: &AppOrchestrator,
    config: &Config,
    token: &str,
    report: StatusReport,
    output: Output,
) -> Result<()> {
    let expected = config.monitor_token()?;
    if !token_matches(expected.as_ref(), token) {
        tracing::warn!("invalid monitor token provided");
        return Err(Error::Unauthorized);
    }

    let site = orchestrator.report_status(report).await?;
    output.site(
        &format!("Site status updated: {} -> {}", site.domain, site.status),
        &site,
    );
    Ok(())
}
