// ABOUTME: Per-operation deployment transcript of timestamped, typed entries.
// ABOUTME: Classifies raw remote output line by line and renders text for operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const TEXT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }

    /// Guess the severity of one line of remote output.
    ///
    /// Case-insensitive substring match; the first matching rule wins.
    pub fn classify(line: &str) -> Self {
        let lower = line.to_lowercase();
        if lower.contains("error") || lower.contains("failed") {
            Severity::Error
        } else if lower.contains("success") || lower.contains("authenticated") {
            Severity::Success
        } else if lower.contains("warning") {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// One line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: String,
    pub icon: String,
}

impl LogEntry {
    /// Render as `<icon> [<timestamp>] <message>`.
    pub fn as_text(&self) -> String {
        format!(
            "{} [{}] {}",
            self.icon,
            self.timestamp.format(TEXT_TIMESTAMP_FORMAT),
            self.message
        )
    }
}

/// Append-only log for a single orchestration call.
///
/// Every entry is mirrored to `tracing` at the matching level.
#[derive(Debug, Default, Clone)]
pub struct DeploymentLog {
    entries: Vec<LogEntry>,
}

impl DeploymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn record(&mut self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        match severity {
            Severity::Error => tracing::error!(target: "pressdock::transcript", "{message}"),
            Severity::Warning => tracing::warn!(target: "pressdock::transcript", "{message}"),
            Severity::Info | Severity::Success => {
                tracing::info!(target: "pressdock::transcript", %severity, "{message}")
            }
        }
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            severity,
            message,
            icon: severity.icon().to_string(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(message, Severity::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.record(message, Severity::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(message, Severity::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(message, Severity::Error);
    }

    /// Split multi-line remote output into entries, skipping blank lines.
    pub fn ingest_raw_output(&mut self, text: &str) {
        for line in text.trim().lines() {
            let line = line.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            self.record(line, Severity::classify(line));
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Copy of the ordered entry sequence, for persisting.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.clone()
    }

    /// The entries with each message replaced by its [`LogEntry::as_text`]
    /// rendering. Severity, icon and timestamp are kept.
    pub fn render_as_text(&self) -> Vec<LogEntry> {
        self.entries
            .iter()
            .map(|entry| LogEntry {
                message: entry.as_text(),
                ..entry.clone()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convenience_wrappers_set_severity_and_icon() {
        let mut log = DeploymentLog::new();
        log.info("a");
        log.success("b");
        log.warning("c");
        log.error("d");

        let severities: Vec<_> = log.entries().iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Info,
                Severity::Success,
                Severity::Warning,
                Severity::Error
            ]
        );
        assert_eq!(log.entries()[3].icon, "❌");
    }

    #[test]
    fn classify_is_case_insensitive_and_ordered() {
        assert_eq!(Severity::classify("ERROR: no such file"), Severity::Error);
        assert_eq!(Severity::classify("Login Failed"), Severity::Error);
        assert_eq!(Severity::classify("Authenticated as root"), Severity::Success);
        assert_eq!(Severity::classify("warning: deprecated"), Severity::Warning);
        assert_eq!(Severity::classify("Creating network"), Severity::Info);
        // error beats success when both appear
        assert_eq!(Severity::classify("success? no, error"), Severity::Error);
    }

    #[test]
    fn ingest_skips_blank_lines() {
        let mut log = DeploymentLog::new();
        log.ingest_raw_output("\nCreating db ... done\n\n   \nWARNING: old compose\n");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].message, "Creating db ... done");
        assert_eq!(log.entries()[1].severity, Severity::Warning);
    }

    #[test]
    fn clear_resets_entries() {
        let mut log = DeploymentLog::new();
        log.error("boom");
        assert!(log.has_errors());
        log.clear();
        assert!(log.is_empty());
        assert!(!log.has_errors());
    }

    #[test]
    fn text_rendering_prefixes_icon_and_timestamp() {
        let mut log = DeploymentLog::new();
        log.success("done");
        log.error("broke");
        let rendered = log.render_as_text();

        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].message.starts_with("✅ ["));
        assert!(rendered[0].message.ends_with("] done"));
        assert_eq!(rendered[0].severity, Severity::Success);
        assert_eq!(rendered[0].timestamp, log.entries()[0].timestamp);
        assert_eq!(rendered[1].severity, Severity::Error);
        assert!(rendered[1].message.ends_with("] broke"));
        assert_eq!(log.entries()[0].message, "done");
    }

    #[test]
    fn entries_serialize_with_type_field() {
        let mut log = DeploymentLog::new();
        log.warning("careful");
        let json = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["message"], "careful");
    }
}
