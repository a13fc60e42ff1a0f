//! Task result gate
//!
//! A pure memoization gate: it decides whether a task body must run based
//! on the presence of a completion marker for the task's fingerprint. It
//! does not define what counts as a task's inputs; see
//! [`crate::task::TaskInputs`].

use crate::cache::CacheStore;
use crate::error::DroverResult;
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Payload stored under a task fingerprint after a satisfactory run
#[derive(Debug, Serialize, Deserialize)]
struct CompletionMarker {
    completed_at: DateTime<Utc>,
}

/// Decides whether a fingerprinted task needs to run
pub struct TaskGate {
    store: Arc<CacheStore>,
}

impl TaskGate {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self { store }
    }

    /// Whether the task body must run.
    ///
    /// `force` bypasses the marker without deleting it; a forced run still
    /// records a fresh completion afterward.
    pub async fn should_run(&self, fingerprint: &Fingerprint, force: bool) -> DroverResult<bool> {
        if force {
            debug!(fingerprint = %fingerprint.short(), "force flag set, bypassing completion marker");
            return Ok(true);
        }

        let satisfied = self.store.exists(fingerprint).await?;
        if satisfied {
            debug!(fingerprint = %fingerprint.short(), "completion marker present, skipping");
        }
        Ok(!satisfied)
    }

    /// Record that the task's fingerprinted inputs produced a good run.
    ///
    /// Any prior marker is dropped first so a forced rerun refreshes the
    /// timestamp without tripping the store's reject-on-mismatch policy.
    pub async fn record_completion(&self, fingerprint: &Fingerprint) -> DroverResult<()> {
        self.store.invalidate(fingerprint).await?;

        let marker = CompletionMarker {
            completed_at: Utc::now(),
        };
        self.store
            .put(fingerprint, &serde_json::to_vec(&marker)?)
            .await?;

        debug!(fingerprint = %fingerprint.short(), "completion recorded");
        Ok(())
    }
}
