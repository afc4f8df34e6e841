// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes for sites and transcripts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::site::{Site, SiteStatus};
use crate::store::Paginated;
use crate::transcript::LogEntry;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

/// Secret-free view of a site for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub id: u64,
    pub domain: String,
    pub container_name: String,
    pub server: String,
    pub http_port: u16,
    pub status: SiteStatus,
    pub status_color: &'static str,
    pub last_deployed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Site> for SiteView {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id.get(),
            domain: site.domain.clone(),
            container_name: site.container_name.to_string(),
            server: site.server.address(),
            http_port: site.http_port,
            status: site.status,
            status_color: site.status.color(),
            last_deployed_at: site.last_deployed_at,
            created_at: site.created_at,
        }
    }
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.event("success", message, None),
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.event("warning", message, None),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                    site: None,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the outcome of an operation on one site.
    pub fn site(&self, message: &str, site: &Site) {
        match self.mode {
            OutputMode::Normal => {
                self.success(message);
                println!(
                    "  {} [{}] {} -> {}:{}",
                    site.id,
                    site.status,
                    site.domain,
                    site.server.ip,
                    site.http_port
                );
            }
            OutputMode::Quiet => println!("{}", site.id),
            OutputMode::Json => self.event("success", message, Some(SiteView::from(site))),
        }
    }

    /// Print a transcript (suppressed in quiet mode).
    pub fn transcript(&self, entries: &[LogEntry]) {
        match self.mode {
            OutputMode::Normal => {
                for entry in entries {
                    println!("{}", entry.as_text());
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Json => {
                for entry in entries {
                    if let Ok(json) = serde_json::to_string(entry) {
                        println!("{json}");
                    }
                }
            }
        }
    }

    /// Print one page of sites.
    pub fn sites(&self, page: &Paginated<Site>) {
        match self.mode {
            OutputMode::Normal => {
                if page.items.is_empty() {
                    println!("No sites.");
                    return;
                }
                println!(
                    "{:>4}  {:<32} {:<22} {:>6}  {:<10} LAST DEPLOYED",
                    "ID", "DOMAIN", "SERVER", "PORT", "STATUS"
                );
                for site in &page.items {
                    let deployed = site
                        .last_deployed_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "{:>4}  {:<32} {:<22} {:>6}  {:<10} {}",
                        site.id,
                        site.domain,
                        site.server.address(),
                        site.http_port,
                        site.status,
                        deployed
                    );
                }
                println!(
                    "Page {} of {} ({} sites)",
                    page.current_page, page.last_page, page.total
                );
            }
            OutputMode::Quiet => {
                for site in &page.items {
                    println!("{}", site.id);
                }
            }
            OutputMode::Json => {
                let views = Paginated {
                    items: page.items.iter().map(SiteView::from).collect::<Vec<_>>(),
                    current_page: page.current_page,
                    last_page: page.last_page,
                    per_page: page.per_page,
                    total: page.total,
                };
                if let Ok(json) = serde_json::to_string(&views) {
                    println!("{json}");
                }
            }
        }
    }

    fn event(&self, event: &str, message: &str, site: Option<SiteView>) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
            site,
        };
        if let Ok(json) = serde_json::to_string(&event) {
            println!("{json}");
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site: Option<SiteView>,
}
