//! Durable fingerprint → payload store
//!
//! One file per entry, named by the full hex fingerprint, containing a JSON
//! envelope with the creation timestamp and the hex-encoded payload. Writes
//! land in a temporary file in the same directory and are published with a
//! single rename.
//!
//! `put` is idempotent for an identical payload. Writing a different
//! payload under an existing fingerprint is rejected with
//! `FingerprintCollision` rather than overwritten: a key that maps to two
//! payloads means the fingerprint inputs are wrong somewhere, and that bug
//! should surface early.

use crate::error::{DroverError, DroverResult};
use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// JSON envelope persisted per entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    created_at: DateTime<Utc>,
    /// Hex-encoded payload bytes
    payload: String,
}

/// Fingerprint-keyed key/value store over one directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    entries_dir: PathBuf,
}

impl CacheStore {
    pub fn new(entries_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries_dir: entries_dir.into(),
        }
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.entries_dir.join(fingerprint.to_hex())
    }

    /// Whether an entry exists for this fingerprint
    pub async fn exists(&self, fingerprint: &Fingerprint) -> DroverResult<bool> {
        let path = self.entry_path(fingerprint);
        fs::try_exists(&path)
            .await
            .map_err(|e| DroverError::store(format!("checking {}", path.display()), e))
    }

    /// Read an entry's payload; `None` on a miss
    pub async fn get(&self, fingerprint: &Fingerprint) -> DroverResult<Option<Vec<u8>>> {
        Ok(self
            .read_entry(fingerprint)
            .await?
            .map(|(payload, _)| payload))
    }

    /// Creation timestamp of an entry, if present
    pub async fn created_at(
        &self,
        fingerprint: &Fingerprint,
    ) -> DroverResult<Option<DateTime<Utc>>> {
        Ok(self
            .read_entry(fingerprint)
            .await?
            .map(|(_, created_at)| created_at))
    }

    /// Write an entry.
    ///
    /// No-op if the fingerprint already holds an identical payload;
    /// `FingerprintCollision` if it holds a different one. The write is
    /// atomic from a reader's perspective.
    pub async fn put(&self, fingerprint: &Fingerprint, payload: &[u8]) -> DroverResult<()> {
        if let Some(existing) = self.get(fingerprint).await? {
            if existing == payload {
                debug!(fingerprint = %fingerprint.short(), "cache entry already present");
                return Ok(());
            }
            return Err(DroverError::FingerprintCollision {
                fingerprint: fingerprint.to_hex(),
            });
        }

        fs::create_dir_all(&self.entries_dir)
            .await
            .map_err(|e| DroverError::store(format!("creating {}", self.entries_dir.display()), e))?;

        let entry = StoredEntry {
            created_at: Utc::now(),
            payload: hex::encode(payload),
        };
        let json = serde_json::to_vec(&entry)?;

        // Write-temp-then-rename so readers never see a partial entry
        let final_path = self.entry_path(fingerprint);
        let tmp_path = self
            .entries_dir
            .join(format!(".{}.{}.tmp", fingerprint.short(), Uuid::new_v4()));

        fs::write(&tmp_path, &json)
            .await
            .map_err(|e| DroverError::store(format!("writing {}", tmp_path.display()), e))?;

        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(DroverError::store(
                format!("publishing {}", final_path.display()),
                e,
            ));
        }

        debug!(fingerprint = %fingerprint.short(), bytes = payload.len(), "cache entry written");
        Ok(())
    }

    /// Remove an entry; removing a missing entry is a no-op
    pub async fn invalidate(&self, fingerprint: &Fingerprint) -> DroverResult<()> {
        let path = self.entry_path(fingerprint);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(fingerprint = %fingerprint.short(), "cache entry invalidated");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DroverError::store(
                format!("removing {}", path.display()),
                e,
            )),
        }
    }

    /// All fingerprints with an entry in the store
    pub async fn list(&self) -> DroverResult<Vec<Fingerprint>> {
        let mut fingerprints = Vec::new();

        let mut entries = match fs::read_dir(&self.entries_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(fingerprints),
            Err(e) => {
                return Err(DroverError::store(
                    format!("listing {}", self.entries_dir.display()),
                    e,
                ))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DroverError::store("listing cache entries", e))?
        {
            // Skip temp files and anything that is not a fingerprint name
            if let Some(fp) = entry
                .file_name()
                .to_str()
                .and_then(Fingerprint::from_hex)
            {
                fingerprints.push(fp);
            }
        }

        Ok(fingerprints)
    }

    async fn read_entry(
        &self,
        fingerprint: &Fingerprint,
    ) -> DroverResult<Option<(Vec<u8>, DateTime<Utc>)>> {
        let path = self.entry_path(fingerprint);

        let json = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DroverError::store(
                    format!("reading {}", path.display()),
                    e,
                ))
            }
        };

        let entry: StoredEntry =
            serde_json::from_slice(&json).map_err(|e| DroverError::StoreCorrupt {
                fingerprint: fingerprint.to_hex(),
                reason: e.to_string(),
            })?;

        let payload = hex::decode(&entry.payload).map_err(|e| DroverError::StoreCorrupt {
            fingerprint: fingerprint.to_hex(),
            reason: format!("payload is not valid hex: {e}"),
        })?;

        Ok(Some((payload, entry.created_at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::FingerprintInput;
    use tempfile::TempDir;

    fn fp(seed: &str) -> Fingerprint {
        Fingerprint::compute(&[FingerprintInput::literal(seed)]).unwrap()
    }

    fn store_in(temp: &TempDir) -> CacheStore {
        CacheStore::new(temp.path().join("entries"))
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        assert_eq!(store.get(&fp("a")).await.unwrap(), None);
        assert!(!store.exists(&fp("a")).await.unwrap());
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"payload").await.unwrap();

        assert!(store.exists(&fp("a")).await.unwrap());
        assert_eq!(store.get(&fp("a")).await.unwrap(), Some(b"payload".to_vec()));
        assert!(store.created_at(&fp("a")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn put_identical_payload_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"payload").await.unwrap();
        store.put(&fp("a"), b"payload").await.unwrap();

        assert_eq!(store.get(&fp("a")).await.unwrap(), Some(b"payload".to_vec()));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn put_different_payload_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"first").await.unwrap();
        let result = store.put(&fp("a"), b"second").await;

        assert!(matches!(
            result,
            Err(DroverError::FingerprintCollision { .. })
        ));
        // First payload untouched
        assert_eq!(store.get(&fp("a")).await.unwrap(), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"payload").await.unwrap();
        store.invalidate(&fp("a")).await.unwrap();

        assert_eq!(store.get(&fp("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidate_missing_is_noop() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.invalidate(&fp("never-written")).await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_entry_is_loud() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let key = fp("a");

        std::fs::create_dir_all(temp.path().join("entries")).unwrap();
        std::fs::write(
            temp.path().join("entries").join(key.to_hex()),
            b"not json at all",
        )
        .unwrap();

        assert!(matches!(
            store.get(&key).await,
            Err(DroverError::StoreCorrupt { .. })
        ));
    }

    #[tokio::test]
    async fn list_skips_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"one").await.unwrap();
        store.put(&fp("b"), b"two").await.unwrap();
        std::fs::write(temp.path().join("entries").join(".abc.tmp"), b"junk").unwrap();

        let mut listed = store.list().await.unwrap();
        listed.sort();
        let mut expected = vec![fp("a"), fp("b")];
        expected.sort();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn distinct_fingerprints_are_independent() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.put(&fp("a"), b"one").await.unwrap();
        store.put(&fp("b"), b"two").await.unwrap();

        assert_eq!(store.get(&fp("a")).await.unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get(&fp("b")).await.unwrap(), Some(b"two".to_vec()));
    }
}
