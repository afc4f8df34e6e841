// ABOUTME: Entry point for the pressdock CLI application.
// ABOUTME: Parses arguments, loads configuration, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use pressdock::config::{self, Config};
use pressdock::deploy::StatusReport;
use pressdock::error::Result;
use pressdock::output::{Output, OutputMode};
use pressdock::store::Page;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = output_mode(&cli);
    if let Err(e) = run(cli).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => Config::discover(&env::current_dir()?),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(output_mode(&cli));

    if let Commands::Init { force } = cli.command {
        let cwd = env::current_dir()?;
        config::init_config(&cwd, force)?;
        output.success(&format!("Created {}", config::CONFIG_FILENAME));
        return Ok(());
    }

    let config = load_config(&cli)?;
    let orchestrator = commands::orchestrator(&config).await?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Create(args) => commands::create(&orchestrator, args, output).await,
        Commands::Update { id, changes } => {
            commands::update(&orchestrator, id, changes, output).await
        }
        Commands::Deploy { id } => commands::deploy(&orchestrator, id, output).await,
        Commands::Stop { id } => commands::stop(&orchestrator, id, output).await,
        Commands::Delete { id } => commands::delete(&orchestrator, id, output).await,
        Commands::List { page, per_page } => {
            commands::list(&orchestrator, Page::new(page, per_page), output).await
        }
        Commands::Logs { id } => commands::logs(&orchestrator, id, output).await,
        Commands::ReportStatus {
            token,
            domain,
            status,
            container_name,
        } => {
            let report = StatusReport {
                domain,
                status,
                container_name,
            };
            commands::report_status(&orchestrator, &config, &token, report, output).await
        }
    }
}
