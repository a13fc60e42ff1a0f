//! On-disk layout of the cache root

use crate::error::{DroverError, DroverResult};
use crate::fingerprint::Fingerprint;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Resolved directory layout under one cache root
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default cache root: `~/.cache/drover`
    pub fn default_root() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drover")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of fingerprint-named cache entries
    pub fn entries_dir(&self) -> PathBuf {
        self.root.join("entries")
    }

    /// Directory of fingerprint-named imported artifacts
    pub fn artifacts_dir(&self) -> PathBuf {
        self.root.join("artifacts")
    }

    /// Directory for in-progress fetches before atomic promotion
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    /// Final fingerprint-addressed location of an imported artifact
    pub fn artifact_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.artifacts_dir().join(fingerprint.to_hex())
    }

    /// Create all cache directories if missing
    pub async fn ensure(&self) -> DroverResult<()> {
        for dir in [
            self.entries_dir(),
            self.artifacts_dir(),
            self.staging_dir(),
        ] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| DroverError::store(format!("creating {}", dir.display()), e))?;
        }
        Ok(())
    }
}
