//! Registry collaborator seam
//!
//! The resolver and importer only speak to registries through the
//! [`PackageManager`] trait: resolve a constraint to a concrete version
//! plus integrity token, and fetch that version into a destination
//! directory. Both operations are treated as slow and fallible.
//!
//! [`DirRegistry`] is the bundled implementation: a registry rooted at a
//! directory with one subdirectory per package name and one per published
//! version, e.g. `<root>/acme/toolkit/2.3.1/`. The integrity token is a
//! deterministic content hash over the version tree, so republishing
//! different bytes under the same version yields a different import
//! fingerprint.

use crate::error::{DroverError, DroverResult};
use crate::fingerprint::frame;
use async_trait::async_trait;
use semver::{Version, VersionReq};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Version resolution and fetching for one package origin
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Registry name this manager serves
    fn origin(&self) -> &str;

    /// Human-readable source location, recorded on resolved packages
    fn source_location(&self) -> String;

    /// Pick the latest published version satisfying `constraint`.
    ///
    /// Returns the concrete version and its integrity token.
    async fn resolve_version(
        &self,
        name: &str,
        constraint: &VersionReq,
    ) -> DroverResult<(Version, String)>;

    /// Materialize a package version's contents into `dest`
    async fn fetch(&self, name: &str, version: &Version, dest: &Path) -> DroverResult<()>;
}

/// Configured registries, looked up by origin name
#[derive(Default)]
pub struct Registries {
    managers: HashMap<String, Arc<dyn PackageManager>>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager under its origin name
    pub fn insert(&mut self, manager: Arc<dyn PackageManager>) {
        self.managers.insert(manager.origin().to_string(), manager);
    }

    /// Look up the manager for an origin
    pub fn get(&self, origin: &str) -> DroverResult<Arc<dyn PackageManager>> {
        self.managers
            .get(origin)
            .cloned()
            .ok_or_else(|| DroverError::OriginUnreachable {
                origin: origin.to_string(),
                reason: "no registry configured for this origin".to_string(),
            })
    }
}

/// Directory-backed registry
pub struct DirRegistry {
    origin: String,
    root: PathBuf,
}

impl DirRegistry {
    pub fn new(origin: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            origin: origin.into(),
            root: root.into(),
        }
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for segment in name.split('/') {
            dir.push(segment);
        }
        dir
    }
}

#[async_trait]
impl PackageManager for DirRegistry {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn source_location(&self) -> String {
        self.root.display().to_string()
    }

    async fn resolve_version(
        &self,
        name: &str,
        constraint: &VersionReq,
    ) -> DroverResult<(Version, String)> {
        if !self.root.is_dir() {
            return Err(DroverError::OriginUnreachable {
                origin: self.origin.clone(),
                reason: format!("registry root {} does not exist", self.root.display()),
            });
        }

        let package_dir = self.package_dir(name);
        let unresolvable = || DroverError::UnresolvableReference {
            name: name.to_string(),
            constraint: constraint.to_string(),
        };

        let entries = std::fs::read_dir(&package_dir).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                unresolvable()
            } else {
                DroverError::OriginUnreachable {
                    origin: self.origin.clone(),
                    reason: format!("reading {}: {e}", package_dir.display()),
                }
            }
        })?;

        // Latest satisfying version wins
        let mut best: Option<Version> = None;
        for entry in entries.flatten() {
            let Some(candidate) = entry
                .file_name()
                .to_str()
                .and_then(|s| Version::parse(s).ok())
            else {
                continue;
            };
            if constraint.matches(&candidate) && best.as_ref().is_none_or(|b| candidate > *b) {
                best = Some(candidate);
            }
        }
        let version = best.ok_or_else(unresolvable)?;

        let version_dir = package_dir.join(version.to_string());
        let integrity = {
            let dir = version_dir.clone();
            run_blocking(move || hash_tree(&dir)).await?
        };

        debug!(
            origin = %self.origin,
            name,
            %version,
            integrity = %integrity,
            "resolved package version"
        );
        Ok((version, integrity))
    }

    async fn fetch(&self, name: &str, version: &Version, dest: &Path) -> DroverResult<()> {
        let version_dir = self.package_dir(name).join(version.to_string());
        if !version_dir.is_dir() {
            return Err(DroverError::fetch_failed(
                name,
                format!("{} is not in the registry", version_dir.display()),
            ));
        }

        debug!(origin = %self.origin, name, %version, dest = %dest.display(), "fetching package");

        let name = name.to_string();
        let dest = dest.to_path_buf();
        run_blocking(move || {
            copy_tree(&version_dir, &dest)
                .map_err(|e| DroverError::fetch_failed(&name, e.to_string()))
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> DroverResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DroverResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => Err(DroverError::Internal(format!("registry worker failed: {e}"))),
    }
}

/// Deterministic content hash of a directory tree.
///
/// Files are visited in sorted order; each contributes its slash-separated
/// relative path and its bytes, length-framed, to one SHA256 digest.
pub fn hash_tree(dir: &Path) -> DroverResult<String> {
    let mut hasher = Sha256::new();
    hash_tree_inner(dir, Path::new(""), &mut hasher)?;
    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

fn hash_tree_inner(dir: &Path, relative: &Path, hasher: &mut Sha256) -> DroverResult<()> {
    let read_err = |e| DroverError::io(format!("reading {}", dir.display()), e);

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(read_err)?
        .collect::<Result<_, _>>()
        .map_err(read_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let rel = relative.join(entry.file_name());
        if path.is_dir() {
            hash_tree_inner(&path, &rel, hasher)?;
        } else {
            let contents = std::fs::read(&path)
                .map_err(|e| DroverError::io(format!("reading {}", path.display()), e))?;
            let rel_text = rel
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            frame(hasher, rel_text.as_bytes());
            frame(hasher, &contents);
        }
    }
    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
