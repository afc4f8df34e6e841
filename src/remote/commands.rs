// ABOUTME: Shell commands run on the remote host for a site's stack.
// ABOUTME: Each command carries a loggable display form so secrets stay out of transcripts.

use std::time::Duration;

use crate::compose::COMPOSE_FILE_NAME;
use crate::types::ContainerName;

pub const DEFAULT_ROOT: &str = "/opt/wordpress";

/// A command and the text used when logging it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    command: String,
    display: String,
}

impl RemoteCommand {
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            display: command.clone(),
            command,
        }
    }

    /// A command whose full text must not be logged.
    pub fn redacted(command: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            display: display.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Directory layout of stacks on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLayout {
    root: String,
}

impl Default for RemoteLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl RemoteLayout {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let trimmed = root.trim_end_matches('/');
        Self {
            root: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn site_dir(&self, name: &ContainerName) -> String {
        if self.root == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.root)
        }
    }

    pub fn make_dir(&self, name: &ContainerName) -> RemoteCommand {
        RemoteCommand::new(format!("mkdir -p {}", self.site_dir(name)))
    }

    /// Write the compose file with a quoted heredoc, so nothing in it is expanded.
    pub fn write_compose(&self, name: &ContainerName, contents: &str) -> RemoteCommand {
        let path = format!("{}/{COMPOSE_FILE_NAME}", self.site_dir(name));
        RemoteCommand::redacted(
            format!("cat > {path} << 'EOF'\n{}\nEOF", contents.trim_end()),
            format!("cat > {path} << 'EOF' [compose file, {} bytes]", contents.len()),
        )
    }

    pub fn compose_up(&self, name: &ContainerName) -> RemoteCommand {
        RemoteCommand::new(format!(
            "cd {} && docker-compose up -d",
            self.site_dir(name)
        ))
    }

    pub fn compose_down(&self, name: &ContainerName) -> RemoteCommand {
        RemoteCommand::new(format!("cd {} && docker-compose down", self.site_dir(name)))
    }

    /// [`remove_stack`](Self::remove_stack), skipped when the directory was
    /// never created.
    pub fn remove_stack_if_present(&self, name: &ContainerName) -> RemoteCommand {
        let dir = self.site_dir(name);
        RemoteCommand::new(format!(
            "if [ -d {dir} ]; then cd {dir} && docker-compose down -v && rm -rf {dir}; fi"
        ))
    }

    /// Move a stack directory, skipped when the source was never created.
    pub fn rename(&self, from: &ContainerName, to: &ContainerName) -> RemoteCommand {
        let from = self.site_dir(from);
        RemoteCommand::new(format!(
            "if [ -d {from} ]; then mv {from} {}; fi",
            self.site_dir(to)
        ))
    }

    /// Stop the stack, drop its volumes, and delete the directory.
    pub fn remove_stack(&self, name: &ContainerName) -> RemoteCommand {
        let dir = self.site_dir(name);
        RemoteCommand::new(format!(
            "cd {dir} && docker-compose down -v && rm -rf {dir}"
        ))
    }
}

pub fn settle(delay: Duration) -> RemoteCommand {
    RemoteCommand::new(format!("sleep {}", delay.as_secs()))
}

/// Best-effort database drop through the host's mysql client.
pub fn drop_database(database: &str) -> RemoteCommand {
    RemoteCommand::new(format!(
        "mysql -e 'DROP DATABASE IF EXISTS `{database}`;'"
    ))
}
