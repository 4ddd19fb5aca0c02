//! Pluggable key-value backends for cached views.

use async_trait::async_trait;
use common::Error;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// One cached view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: serde_json::Value,
    pub stored_at_epoch_millis: i64,
}

/// Lookup and upsert by view key. Upserts are last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error>;
    async fn put(&self, entry: CacheEntry) -> Result<(), Error>;
}

// ── In-memory ─────────────────────────────────────────────────────────

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), Error> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

// ── JSON files ────────────────────────────────────────────────────────

/// One JSON file per key under a directory. Survives restarts.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::CacheBackend(format!(
                    "reading {}: {e}",
                    path.display()
                )))
            }
        };
        let entry = serde_json::from_slice(&raw).map_err(|e| {
            Error::CacheBackend(format!("corrupt cache file {}: {e}", path.display()))
        })?;
        Ok(Some(entry))
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::CacheBackend(format!("creating {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(&entry.key);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_vec(&entry)?;

        // Write-then-rename so readers never see a half-written file.
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| Error::CacheBackend(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::CacheBackend(format!("replacing {}: {e}", path.display())))?;

        debug!("Cache entry {} written to {}", entry.key, path.display());
        Ok(())
    }
}

/// Filename-safe, collision-free key encoding.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(key: &str, n: i64) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            payload: json!({"n": n}),
            stored_at_epoch_millis: n,
        }
    }

    #[tokio::test]
    async fn test_memory_store_upsert_overwrites() {
        let store = MemoryStore::new();
        assert!(store.get("feed").await.unwrap().is_none());

        store.put(entry("feed", 1)).await.unwrap();
        store.put(entry("feed", 2)).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("feed").await.unwrap(), Some(entry("feed", 2)));
    }

    #[tokio::test]
    async fn test_file_store_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let key = "feed:2026-10-14..2026-10-20";

        JsonFileStore::new(dir.path()).put(entry(key, 7)).await.unwrap();
        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get(key).await.unwrap(), Some(entry(key, 7)));
        assert!(reopened.get("browse:0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path_for("neo:1"), b"{not json").unwrap();

        let err = store.get("neo:1").await.unwrap_err();
        assert!(matches!(err, Error::CacheBackend(_)));
    }

    #[test]
    fn test_key_encoding_is_injective_for_lookalikes() {
        assert_eq!(encode_key("browse_0"), "browse_0");
        assert_eq!(encode_key("browse:0"), "browse%3A0");
        assert_ne!(encode_key("a/b"), encode_key("a_b"));
        assert_eq!(encode_key("../x"), "..%2Fx");
    }
}
