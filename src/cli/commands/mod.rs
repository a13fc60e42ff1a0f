//! Command implementations

pub mod cache;
pub mod config;
pub mod import;
pub mod run;

pub use cache::execute as cache;
pub use config::execute as config;
pub use import::execute as import;
pub use run::execute as run;

use crate::cache::{CacheLayout, CacheStore};
use crate::config::Config;
use crate::remote::{PackageImporter, PackageResolver};
use crate::task::TaskGate;
use std::sync::Arc;

/// Cache and import subsystem, wired once per command invocation.
///
/// Construction is pure; directories are created lazily by the parts
/// that write.
pub(crate) struct Runtime {
    pub layout: CacheLayout,
    pub store: Arc<CacheStore>,
    pub importer: Arc<PackageImporter>,
    pub gate: TaskGate,
}

pub(crate) fn build_runtime(config: &Config) -> Runtime {
    let layout = config.cache_layout();
    let store = Arc::new(CacheStore::new(layout.entries_dir()));
    let registries = Arc::new(config.build_registries());
    let resolver = PackageResolver::new(registries.clone());
    let importer = Arc::new(PackageImporter::new(
        resolver,
        store.clone(),
        layout.clone(),
        registries,
    ));
    let gate = TaskGate::new(store.clone());

    Runtime {
        layout,
        store,
        importer,
        gate,
    }
}
