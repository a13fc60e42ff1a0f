//! Remote reference resolution
//!
//! Turns a [`RemoteReference`] into a concrete, version-pinned
//! [`ResolvedPackage`] through the origin's registry. Resolutions are
//! memoized for the lifetime of the resolver, so one logical run always
//! sees the same concrete version for a given reference; a fresh run may
//! pick up a newer satisfying version.

use crate::error::DroverResult;
use crate::fingerprint::{Fingerprint, FingerprintInput};
use crate::remote::reference::RemoteReference;
use crate::remote::registry::Registries;
use semver::Version;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Concrete, version-pinned form of a remote reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Registry the package was resolved against
    pub origin: String,
    /// Package identifier within the registry
    pub name: String,
    /// Concrete version picked by the registry
    pub version: Version,
    /// Where the registry serves this package from
    pub source: String,
    /// Content integrity token supplied by the registry
    pub integrity: String,
    /// Directory inside the package requested by the reference
    pub subpath: Option<String>,
}

impl ResolvedPackage {
    /// Canonical identifier: `origin:name`
    pub fn canonical_id(&self) -> String {
        format!("{}:{}", self.origin, self.name)
    }

    /// Ordered fingerprint inputs identifying this package's content.
    ///
    /// The integrity token participates so that two different publishes
    /// satisfying the same constraint never share a cache key. The subpath
    /// does not: it selects within an artifact, it does not change one.
    pub fn fingerprint_inputs(&self) -> Vec<FingerprintInput> {
        vec![
            FingerprintInput::literal(self.canonical_id().into_bytes()),
            FingerprintInput::literal(self.version.to_string()),
            FingerprintInput::literal(self.integrity.as_bytes()),
        ]
    }

    /// Cache key for importing this package
    pub fn fingerprint(&self) -> DroverResult<Fingerprint> {
        Fingerprint::compute(&self.fingerprint_inputs())
    }
}

/// Reference → resolved package, stable within one run
pub struct PackageResolver {
    registries: Arc<Registries>,
    resolved: Mutex<HashMap<RemoteReference, ResolvedPackage>>,
}

impl PackageResolver {
    pub fn new(registries: Arc<Registries>) -> Self {
        Self {
            registries,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a reference, reusing this run's prior resolution if any.
    ///
    /// The resolver performs no retries; network-class failures surface to
    /// the caller as-is.
    pub async fn resolve(&self, reference: &RemoteReference) -> DroverResult<ResolvedPackage> {
        if let Some(hit) = self.resolved.lock().await.get(reference) {
            debug!(reference = %reference, version = %hit.version, "reusing resolution");
            return Ok(hit.clone());
        }

        let manager = self.registries.get(&reference.origin)?;
        let (version, integrity) = manager
            .resolve_version(&reference.name, &reference.constraint)
            .await?;

        let package = ResolvedPackage {
            origin: reference.origin.clone(),
            name: reference.name.clone(),
            version,
            source: manager.source_location(),
            integrity,
            subpath: reference.subpath.clone(),
        };

        // Two racing first resolutions keep whichever landed first, so the
        // run stays on a single concrete version per reference.
        let mut memo = self.resolved.lock().await;
        let stable = memo
            .entry(reference.clone())
            .or_insert(package)
            .clone();
        debug!(reference = %reference, version = %stable.version, "resolved reference");
        Ok(stable)
    }
}
