//! Package import orchestration
//!
//! `import` resolves a reference, fingerprints the resolved package, and
//! returns the fingerprint-addressed artifact directory, fetching it at
//! most once. Within one process there is never more than one in-flight
//! fetch per fingerprint: the first caller to miss becomes the leader and
//! fetches; every concurrent caller subscribes to the leader's outcome.
//!
//! Fetches land in a unique staging directory and are promoted to their
//! final location with a single rename, so a crashed or failed fetch can
//! never leave a partial artifact at a fingerprint-addressed path. The
//! same rename gives best-effort safety when separate processes share one
//! cache root.

use crate::cache::{CacheLayout, CacheStore};
use crate::error::{DroverError, DroverResult};
use crate::fingerprint::Fingerprint;
use crate::remote::reference::RemoteReference;
use crate::remote::registry::Registries;
use crate::remote::resolver::{PackageResolver, ResolvedPackage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Payload recorded in the cache store for an imported artifact
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEntry {
    canonical_id: String,
    version: String,
    path: PathBuf,
}

/// Outcome delivered to everyone waiting on one in-flight fetch
#[derive(Debug, Clone)]
enum FetchOutcome {
    Ready(PathBuf),
    Failed(String),
    Canceled,
}

type InFlightMap = Mutex<HashMap<Fingerprint, broadcast::Sender<FetchOutcome>>>;

/// Role a caller takes for a given fingerprint
enum Role<'a> {
    /// This caller performs the fetch
    Leader(InFlightGuard<'a>),
    /// Another caller is already fetching; wait for its outcome
    Waiter(broadcast::Receiver<FetchOutcome>),
}

/// Removes the in-flight entry and publishes the outcome exactly once.
///
/// If the leader's future is dropped mid-fetch (task canceled), `Drop`
/// publishes `Canceled` so waiters are never stranded and never mistake
/// cancellation for a fetch failure.
struct InFlightGuard<'a> {
    map: &'a InFlightMap,
    fingerprint: Fingerprint,
    tx: broadcast::Sender<FetchOutcome>,
    settled: bool,
}

impl InFlightGuard<'_> {
    fn settle(mut self, outcome: FetchOutcome) {
        self.publish(outcome);
        self.settled = true;
    }

    fn publish(&self, outcome: FetchOutcome) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.fingerprint);
        // No receivers is fine: nobody was waiting
        let _ = self.tx.send(outcome);
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.publish(FetchOutcome::Canceled);
        }
    }
}

/// Fingerprint-gated importer for remote packages
pub struct PackageImporter {
    resolver: PackageResolver,
    store: Arc<CacheStore>,
    layout: CacheLayout,
    registries: Arc<Registries>,
    in_flight: InFlightMap,
}

impl PackageImporter {
    pub fn new(
        resolver: PackageResolver,
        store: Arc<CacheStore>,
        layout: CacheLayout,
        registries: Arc<Registries>,
    ) -> Self {
        Self {
            resolver,
            store,
            layout,
            registries,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The resolver backing this importer, for callers that need the
    /// resolved package (not just its artifact path)
    pub fn resolver(&self) -> &PackageResolver {
        &self.resolver
    }

    /// Import a remote reference, returning the local artifact path.
    ///
    /// Cached artifacts are reused without touching the registry. On a
    /// miss, concurrent callers for the same resolved package share a
    /// single fetch; each receives the fetched path, the fetch error, or
    /// `FetchCanceled` if the fetching task was canceled.
    pub async fn import(&self, reference: &RemoteReference) -> DroverResult<PathBuf> {
        let package = self.resolver.resolve(reference).await?;
        let fingerprint = package.fingerprint()?;

        if let Some(path) = self.cached_artifact(&fingerprint).await? {
            debug!(
                package = %package.canonical_id(),
                fingerprint = %fingerprint.short(),
                "artifact cache hit"
            );
            return apply_subpath(path, &package);
        }

        match self.join_or_lead(fingerprint) {
            Role::Waiter(mut rx) => {
                debug!(
                    package = %package.canonical_id(),
                    fingerprint = %fingerprint.short(),
                    "waiting on in-flight fetch"
                );
                match rx.recv().await {
                    Ok(FetchOutcome::Ready(path)) => apply_subpath(path, &package),
                    Ok(FetchOutcome::Failed(reason)) => {
                        Err(DroverError::fetch_failed(package.canonical_id(), reason))
                    }
                    Ok(FetchOutcome::Canceled) | Err(_) => Err(DroverError::FetchCanceled {
                        name: package.canonical_id(),
                    }),
                }
            }
            Role::Leader(guard) => match self.fetch_and_publish(&package, &fingerprint).await {
                Ok(path) => {
                    guard.settle(FetchOutcome::Ready(path.clone()));
                    apply_subpath(path, &package)
                }
                Err(e) => {
                    // Entry is removed before the error surfaces, so the
                    // next import starts a fresh attempt instead of
                    // replaying a stale failure.
                    guard.settle(FetchOutcome::Failed(e.to_string()));
                    Err(e)
                }
            },
        }
    }

    /// Atomically either join an in-flight fetch or become its leader.
    ///
    /// The map mutex is held only for the map manipulation here and in
    /// `InFlightGuard`; the fetch itself runs outside any lock.
    fn join_or_lead(&self, fingerprint: Fingerprint) -> Role<'_> {
        let mut map = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(tx) = map.get(&fingerprint) {
            return Role::Waiter(tx.subscribe());
        }

        let (tx, _rx) = broadcast::channel(1);
        map.insert(fingerprint, tx.clone());
        Role::Leader(InFlightGuard {
            map: &self.in_flight,
            fingerprint,
            tx,
            settled: false,
        })
    }

    async fn fetch_and_publish(
        &self,
        package: &ResolvedPackage,
        fingerprint: &Fingerprint,
    ) -> DroverResult<PathBuf> {
        // A previous leader may have finished between our cache check and
        // taking leadership; re-check before going to the registry.
        if let Some(path) = self.cached_artifact(fingerprint).await? {
            return Ok(path);
        }

        self.layout.ensure().await?;
        let staging = self.layout.staging_dir().join(Uuid::new_v4().to_string());
        fs::create_dir_all(&staging)
            .await
            .map_err(|e| DroverError::store(format!("creating {}", staging.display()), e))?;

        let manager = self.registries.get(&package.origin)?;
        if let Err(e) = manager
            .fetch(&package.name, &package.version, &staging)
            .await
        {
            // Partial content is never promoted
            let _ = fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        let final_path = self.layout.artifact_path(fingerprint);
        if let Err(e) = fs::rename(&staging, &final_path).await {
            let lost_race = fs::try_exists(&final_path).await.unwrap_or(false);
            let _ = fs::remove_dir_all(&staging).await;
            if !lost_race {
                return Err(DroverError::store(
                    format!("publishing {}", final_path.display()),
                    e,
                ));
            }
            // Another process published the same fingerprint first; its
            // artifact is byte-equivalent by construction.
        }

        let entry = ArtifactEntry {
            canonical_id: package.canonical_id(),
            version: package.version.to_string(),
            path: final_path.clone(),
        };
        self.store.put(fingerprint, &serde_json::to_vec(&entry)?).await?;

        info!(
            package = %package.canonical_id(),
            version = %package.version,
            fingerprint = %fingerprint.short(),
            "imported package"
        );
        Ok(final_path)
    }

    /// Look up a prior import, validating the artifact still exists.
    ///
    /// An entry whose artifact directory was evicted out-of-band is
    /// invalidated and reported as a miss.
    async fn cached_artifact(&self, fingerprint: &Fingerprint) -> DroverResult<Option<PathBuf>> {
        let Some(payload) = self.store.get(fingerprint).await? else {
            return Ok(None);
        };

        let entry: ArtifactEntry =
            serde_json::from_slice(&payload).map_err(|e| DroverError::StoreCorrupt {
                fingerprint: fingerprint.to_hex(),
                reason: e.to_string(),
            })?;

        let present = fs::try_exists(&entry.path)
            .await
            .map_err(|e| DroverError::store(format!("checking {}", entry.path.display()), e))?;
        if present {
            return Ok(Some(entry.path));
        }

        warn!(
            fingerprint = %fingerprint.short(),
            path = %entry.path.display(),
            "cached artifact missing on disk, treating as miss"
        );
        self.store.invalidate(fingerprint).await?;
        Ok(None)
    }
}

fn apply_subpath(root: PathBuf, package: &ResolvedPackage) -> DroverResult<PathBuf> {
    let Some(ref sub) = package.subpath else {
        return Ok(root);
    };
    let path = root.join(sub);
    if path.exists() {
        Ok(path)
    } else {
        Err(DroverError::fetch_failed(
            package.canonical_id(),
            format!("sub-path '{sub}' not present in package"),
        ))
    }
}
