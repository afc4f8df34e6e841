// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use pressdock::site::{AuthMethod, SiteStatus};
use pressdock::types::SiteId;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pressdock")]
#[command(about = "Provision WordPress sites as Docker Compose stacks over SSH")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (default: discover pressdock.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new pressdock.yml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Register a new site and deploy it
    Create(CreateArgs),

    /// Change a site's configuration and redeploy it
    Update {
        id: SiteId,
        #[command(flatten)]
        changes: UpdateArgs,
    },

    /// Deploy (or redeploy) a site's stack
    Deploy { id: SiteId },

    /// Stop a site's stack, keeping its data
    Stop { id: SiteId },

    /// Remove a site's stack, data, and record
    Delete { id: SiteId },

    /// List sites, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 15)]
        per_page: usize,
    },

    /// Show the transcript of a site's last operation
    Logs { id: SiteId },

    /// Record a status reported by an external monitor
    ReportStatus {
        /// Bearer token shared with the monitor
        #[arg(long, env = "PRESSDOCK_REPORT_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long)]
        domain: String,
        #[arg(long)]
        status: SiteStatus,
        #[arg(long)]
        container_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    Password,
    Key,
}

impl From<AuthArg> for AuthMethod {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::Password => AuthMethod::Password,
            AuthArg::Key => AuthMethod::Key,
        }
    }
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub domain: String,

    #[arg(long)]
    pub server_ip: IpAddr,

    #[arg(long, default_value_t = 22)]
    pub ssh_port: u16,

    #[arg(long)]
    pub ssh_user: String,

    #[arg(long, value_enum, default_value_t = AuthArg::Password)]
    pub auth_method: AuthArg,

    #[arg(long, env = "PRESSDOCK_SSH_PASSWORD", hide_env_values = true)]
    pub ssh_password: Option<String>,

    /// File holding the SSH private key
    #[arg(long)]
    pub ssh_key_file: Option<PathBuf>,

    #[arg(long)]
    pub http_port: u16,

    #[arg(long, default_value = "admin")]
    pub admin_user: String,

    #[arg(long)]
    pub admin_email: String,

    #[arg(long, env = "PRESSDOCK_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,
}

/// Fields left out keep their current value.
#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub domain: Option<String>,

    #[arg(long)]
    pub server_ip: Option<IpAddr>,

    #[arg(long)]
    pub ssh_port: Option<u16>,

    #[arg(long)]
    pub ssh_user: Option<String>,

    #[arg(long, value_enum)]
    pub auth_method: Option<AuthArg>,

    #[arg(long, env = "PRESSDOCK_SSH_PASSWORD", hide_env_values = true)]
    pub ssh_password: Option<String>,

    #[arg(long)]
    pub ssh_key_file: Option<PathBuf>,

    #[arg(long)]
    pub http_port: Option<u16>,

    #[arg(long)]
    pub admin_user: Option<String>,

    #[arg(long)]
    pub admin_email: Option<String>,

    #[arg(long, env = "PRESSDOCK_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,
}
