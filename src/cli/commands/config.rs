//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{DroverError, DroverResult};
use console::style;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> DroverResult<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => show(config),
        ConfigAction::Path => {
            println!("{}", manager.config_path().display());
            Ok(())
        }
        ConfigAction::Init { force } => init(manager, force),
    }
}

/// Print the effective (merged) configuration
fn show(config: &Config) -> DroverResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init(manager: &ConfigManager, force: bool) -> DroverResult<()> {
    if manager.config_path().exists() && !force {
        return Err(DroverError::User(format!(
            "config already exists at {} (use --force to overwrite)",
            manager.config_path().display()
        )));
    }

    manager.save(&Config::default())?;
    println!(
        "{} wrote default config to {}",
        style("✓").green(),
        manager.config_path().display()
    );
    Ok(())
}
