//! Configuration loading and persistence
//!
//! The global config file lives under the platform config directory. A
//! project can override parts of it with a `drover.toml` found by walking
//! upward from the working directory; local values win key by key.

pub mod schema;

pub use schema::{CacheConfig, Config, RegistryConfig};

use crate::error::{DroverError, DroverResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the project-local config file
pub const LOCAL_CONFIG_NAME: &str = "drover.toml";

/// Loads and saves Drover configuration
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default global config path
    pub fn new() -> DroverResult<Self> {
        Ok(Self {
            config_path: Self::default_config_path()?,
        })
    }

    /// Manager for an explicit config file path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `~/.config/drover/config.toml` (platform equivalent)
    pub fn default_config_path() -> DroverResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DroverError::Internal("could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("drover").join("config.toml"))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the global config, falling back to defaults when the file
    /// does not exist
    pub fn load(&self) -> DroverResult<Config> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Self::load_file(&self.config_path)
    }

    /// Load the global config merged with an optional local overlay
    pub fn load_merged(&self, local: Option<&Path>) -> DroverResult<Config> {
        let mut value = if self.config_path.exists() {
            Self::read_value(&self.config_path)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        if let Some(local_path) = local {
            debug!(path = %local_path.display(), "merging local config");
            merge_values(&mut value, Self::read_value(local_path)?);
        }

        value.try_into().map_err(|e| DroverError::ConfigInvalid {
            path: local.unwrap_or(&self.config_path).to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the config to the global path, creating parent directories
    pub fn save(&self, config: &Config) -> DroverResult<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DroverError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, contents)
            .map_err(|e| DroverError::io("writing config file", e))?;

        debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }

    fn load_file(path: &Path) -> DroverResult<Config> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| DroverError::io("reading config file", e))?;
        Ok(toml::from_str(&contents)?)
    }

    fn read_value(path: &Path) -> DroverResult<toml::Value> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| DroverError::io("reading config file", e))?;
        Ok(contents.parse::<toml::Value>()?)
    }
}

/// Find a `drover.toml` by walking upward from `start`
pub fn find_local_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(LOCAL_CONFIG_NAME);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "found local config");
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

/// Recursively merge `overlay` into `base`; overlay scalars win
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_value) => merge_values(base_value, overlay_value),
                    None => {
                        base_table.insert(key, overlay_value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        let config = manager.load().unwrap();
        assert_eq!(config.cache.gc_days, 30);
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        config.cache.gc_days = 7;
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.cache.gc_days, 7);
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "cache = not valid").unwrap();

        let manager = ConfigManager::with_path(path);
        assert!(manager.load().is_err());
    }

    #[test]
    fn local_values_override_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        let local = temp.path().join("drover.toml");
        std::fs::write(
            &global,
            "[cache]\ngc_days = 7\n\n[registries.registry]\npath = \"/srv/global\"\n",
        )
        .unwrap();
        std::fs::write(&local, "[registries.registry]\npath = \"/srv/local\"\n").unwrap();

        let manager = ConfigManager::with_path(global);
        let config = manager.load_merged(Some(&local)).unwrap();

        // Local table entries win, untouched globals survive
        assert_eq!(
            config.registries["registry"].path,
            PathBuf::from("/srv/local")
        );
        assert_eq!(config.cache.gc_days, 7);
    }

    #[test]
    fn local_config_found_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_NAME), "").unwrap();

        let found = find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_NAME));
    }

    #[test]
    fn no_local_config_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(find_local_config(temp.path()).is_none());
    }
}
