//! Configuration schema for Drover
//!
//! Global configuration lives at `~/.config/drover/config.toml`; a
//! project-local `drover.toml` discovered upward from the working
//! directory is merged over it.

use crate::cache::CacheLayout;
use crate::remote::{DirRegistry, Registries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache settings
    pub cache: CacheConfig,

    /// Registries by origin name, e.g. `[registries.registry]`
    pub registries: HashMap<String, RegistryConfig>,
}

impl Config {
    /// Cache layout for the configured (or default) cache root
    pub fn cache_layout(&self) -> CacheLayout {
        let root = self
            .cache
            .root
            .clone()
            .unwrap_or_else(CacheLayout::default_root);
        CacheLayout::new(root)
    }

    /// Build the registry set from the `[registries]` table
    pub fn build_registries(&self) -> Registries {
        let mut registries = Registries::new();
        for (origin, registry) in &self.registries {
            registries.insert(Arc::new(DirRegistry::new(origin, &registry.path)));
        }
        registries
    }
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (default: `~/.cache/drover`)
    pub root: Option<PathBuf>,

    /// `cache gc` removes entries older than this many days
    pub gc_days: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            gc_days: 30,
        }
    }
}

/// One configured registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory the registry serves packages from
    pub path: PathBuf,
}
