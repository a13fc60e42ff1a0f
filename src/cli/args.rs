//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Drover - fingerprint-gated task runner
///
/// Runs commands only when their inputs changed, and imports remote
/// packages through a content-addressed cache.
#[derive(Parser, Debug)]
#[command(name = "drover")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DROVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local drover.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a command, skipping it when its inputs are unchanged
    Run(RunArgs),

    /// Import remote packages into the cache and print their paths
    Import(ImportArgs),

    /// Manage the fingerprint cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run even when a completion marker exists for these inputs
    #[arg(short, long)]
    pub force: bool,

    /// File whose contents count as a task input (repeatable)
    #[arg(short, long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Remote package the task needs, as [origin:]name@constraint[#subpath]
    /// (repeatable)
    #[arg(short, long = "require")]
    pub requires: Vec<String>,

    /// Command and arguments to run
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for the import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// References to import, as [origin:]name@constraint[#subpath]
    #[arg(required = true)]
    pub references: Vec<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache location and contents summary
    Info,

    /// Remove entries older than N days, plus abandoned staging dirs
    Gc {
        /// Remove entries older than N days (default: from config)
        #[arg(long)]
        days: Option<u32>,

        /// Dry run - show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear the cache
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run() {
        let cli = Cli::parse_from(["drover", "run", "--force", "--", "make", "build"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.force);
                assert_eq!(args.command, vec!["make", "build"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_run_requires_command() {
        assert!(Cli::try_parse_from(["drover", "run"]).is_err());
    }

    #[test]
    fn cli_parses_run_inputs_and_requires() {
        let cli = Cli::parse_from([
            "drover",
            "run",
            "-i",
            "Makefile",
            "-i",
            "src/main.c",
            "-r",
            "acme/toolkit@^2",
            "--",
            "make",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.requires, vec!["acme/toolkit@^2"]);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn cli_parses_import() {
        let cli = Cli::parse_from(["drover", "import", "acme/toolkit@^2", "other/lib@1.0.0"]);
        match cli.command {
            Commands::Import(args) => assert_eq!(args.references.len(), 2),
            _ => panic!("expected Import command"),
        }
    }

    #[test]
    fn cli_import_requires_reference() {
        assert!(Cli::try_parse_from(["drover", "import"]).is_err());
    }

    #[test]
    fn cli_parses_cache_gc() {
        let cli = Cli::parse_from(["drover", "cache", "gc", "--days", "7", "--dry-run"]);
        match cli.command {
            Commands::Cache(args) => match args.action {
                CacheAction::Gc { days, dry_run } => {
                    assert_eq!(days, Some(7));
                    assert!(dry_run);
                }
                _ => panic!("expected Gc action"),
            },
            _ => panic!("expected Cache command"),
        }
    }

    #[test]
    fn cli_parses_config_show() {
        let cli = Cli::parse_from(["drover", "config", "show"]);
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, Some(ConfigAction::Show))),
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn cli_no_local_flag() {
        let cli = Cli::parse_from(["drover", "--no-local", "cache", "info"]);
        assert!(cli.no_local);
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["drover", "cache", "info"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["drover", "-vv", "cache", "info"]);
        assert_eq!(cli.verbose, 2);
    }
}
