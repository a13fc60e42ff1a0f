//! Drover - fingerprint-gated task runner
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use drover::cli::{Cli, Commands};
use drover::config::{find_local_config, ConfigManager};
use drover::error::DroverResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DroverResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("drover=warn"),
        1 => EnvFilter::new("drover=info"),
        _ => EnvFilter::new("drover=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()?
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| drover::error::DroverError::io("getting current directory", e))?;
        find_local_config(&cwd)
    };

    let config = config_manager.load_merged(local_config_path.as_deref())?;

    // Dispatch to command
    match cli.command {
        Commands::Run(args) => drover::cli::commands::run(args, &config).await,
        Commands::Import(args) => drover::cli::commands::import(args, &config).await,
        Commands::Cache(args) => drover::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            drover::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
