//! Last Request Store Module
//!
//! Durable, TTL-scoped store of the most recent request payload per
//! (endpoint, tenant) pair, backed by a JSON snapshot file.
//!
//! Durability model: the store must survive process restarts, but it does
//! not need transactional guarantees. Losing the very latest save on a
//! crash is acceptable since the caller can simply issue the request again.
//! The snapshot is rewritten whole on every save through a temp-file-and-
//! rename step, so a crash mid-write can never corrupt the existing file.
//! The write itself runs on the blocking pool, keeping the slow disk path
//! off the runtime workers.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, Result};

/// Default retention for stored requests, in days.
pub const DEFAULT_TTL_DAYS: i64 = 30;

// == Stored Request ==
/// The most recently issued request payload for one (endpoint, tenant) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRequest {
    pub endpoint: String,
    pub tenant: String,
    /// Canonicalized request parameters, replayable as-is
    pub payload: Value,
    /// Principal that issued the original request
    pub requested_by: String,
    pub timestamp: DateTime<Utc>,
}

// == Store Stats ==
/// Read-only snapshot of the store for operational visibility.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub ttl_days: i64,
    pub backing_file_bytes: u64,
}

// == Last Request Store ==
/// In-memory mapping of `(endpoint, tenant)` to the latest [`StoredRequest`],
/// persisted after each mutation with the disk write on the blocking pool.
#[derive(Debug)]
pub struct LastRequestStore {
    path: PathBuf,
    ttl: Duration,
    entries: HashMap<String, StoredRequest>,
}

impl LastRequestStore {
    // == Constructor ==
    /// Opens the store at `path`, loading every non-expired entry from the
    /// snapshot file. A missing, unreadable, or corrupt file degrades to an
    /// empty store with a logged warning; it never fails the process.
    pub fn load(path: impl Into<PathBuf>, ttl_days: i64) -> Self {
        let path = path.into();
        let ttl = Duration::days(ttl_days);
        let mut entries = HashMap::new();

        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str::<HashMap<String, StoredRequest>>(&text) {
                    Ok(snapshot) => {
                        let now = Utc::now();
                        for (key, entry) in snapshot {
                            if now - entry.timestamp < ttl {
                                entries.insert(key, entry);
                            }
                        }
                        info!(
                            count = entries.len(),
                            path = %path.display(),
                            "loaded last-request snapshot"
                        );
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "invalid last-request snapshot, starting empty");
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read last-request snapshot, starting empty");
                }
            }
        }

        Self { path, ttl, entries }
    }

    fn key(endpoint: &str, tenant: &str) -> String {
        format!("{}:{}", endpoint, tenant)
    }

    fn is_expired(&self, entry: &StoredRequest) -> bool {
        Utc::now() - entry.timestamp >= self.ttl
    }

    // == Save ==
    /// Records the latest request for `(endpoint, tenant)`, overwriting any
    /// previous one, and rewrites the snapshot file.
    pub async fn save(&mut self, endpoint: &str, tenant: &str, payload: Value, requested_by: &str) {
        let entry = StoredRequest {
            endpoint: endpoint.to_string(),
            tenant: tenant.to_string(),
            payload,
            requested_by: requested_by.to_string(),
            timestamp: Utc::now(),
        };
        self.entries.insert(Self::key(endpoint, tenant), entry);
        self.persist().await;
        debug!(endpoint, tenant, "last request saved");
    }

    // == Get ==
    /// Returns the stored request for `(endpoint, tenant)` if it exists, is
    /// within the TTL, and was issued by `caller`.
    ///
    /// An expired entry found on the way is removed and the removal
    /// persisted. A live entry owned by someone else yields `Forbidden`
    /// without exposing the payload.
    pub async fn get(&mut self, endpoint: &str, tenant: &str, caller: &str) -> Result<StoredRequest> {
        let key = Self::key(endpoint, tenant);
        let Some(entry) = self.entries.get(&key) else {
            return Err(GatewayError::NotFound(format!(
                "no stored request for '{}' / '{}'",
                endpoint, tenant
            )));
        };

        if self.is_expired(entry) {
            self.entries.remove(&key);
            self.persist().await;
            return Err(GatewayError::NotFound(format!(
                "stored request for '{}' / '{}' has expired",
                endpoint, tenant
            )));
        }

        if entry.requested_by != caller {
            return Err(GatewayError::Forbidden(format!(
                "stored request for '{}' / '{}' belongs to another caller",
                endpoint, tenant
            )));
        }

        Ok(entry.clone())
    }

    // == Get All ==
    /// Returns every non-expired request for `endpoint` issued by `caller`,
    /// keyed by tenant. Expired entries encountered during the scan are
    /// dropped and the change persisted.
    pub async fn get_all(&mut self, endpoint: &str, caller: &str) -> BTreeMap<String, StoredRequest> {
        let mut expired_keys = Vec::new();
        let mut result = BTreeMap::new();

        for (key, entry) in &self.entries {
            if entry.endpoint != endpoint {
                continue;
            }
            if self.is_expired(entry) {
                expired_keys.push(key.clone());
            } else if entry.requested_by == caller {
                result.insert(entry.tenant.clone(), entry.clone());
            }
        }

        if !expired_keys.is_empty() {
            for key in expired_keys {
                self.entries.remove(&key);
            }
            self.persist().await;
        }

        result
    }

    // == Cleanup ==
    /// Removes every expired entry in one pass; persists only if anything
    /// changed. Returns the number of entries removed.
    pub async fn cleanup(&mut self) -> usize {
        let before = self.entries.len();
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.timestamp < ttl);

        let removed = before - self.entries.len();
        if removed > 0 {
            self.persist().await;
            info!(removed, "purged expired last requests");
        }
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> StoreStats {
        let expired = self.entries.values().filter(|e| self.is_expired(e)).count();
        StoreStats {
            total: self.entries.len(),
            valid: self.entries.len() - expired,
            expired,
            ttl_days: self.ttl.num_days(),
            backing_file_bytes: fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Persistence ==
    /// Rewrites the snapshot: serialize to `<path>.tmp`, then rename over
    /// the target so readers only ever see a complete document. The disk
    /// write runs on the blocking pool so it cannot stall a runtime worker.
    /// Failures are logged warnings; the in-memory state stays
    /// authoritative.
    async fn persist(&self) {
        let bytes = match serde_json::to_vec_pretty(&self.entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to serialize last-request snapshot");
                return;
            }
        };

        let path = self.path.clone();
        let tmp = path.with_extension("tmp");
        let result = tokio::task::spawn_blocking(move || {
            fs::write(&tmp, bytes)?;
            fs::rename(&tmp, &path)
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(path = %self.path.display(), error = %e, "failed to persist last-request snapshot");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "last-request snapshot write task failed");
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LastRequestStore {
        LastRequestStore::load(dir.path().join("last_requests.json"), DEFAULT_TTL_DAYS)
    }

    fn backdate(store: &mut LastRequestStore, endpoint: &str, tenant: &str, days: i64) {
        let key = LastRequestStore::key(endpoint, tenant);
        let entry = store.entries.get_mut(&key).unwrap();
        entry.timestamp = Utc::now() - Duration::days(days);
    }

    #[tokio::test]
    async fn test_save_and_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let payload = json!({"start_date": "2025-01-01", "end_date": "2025-01-31"});
        store.save("basic-data", "tenant-x", payload.clone(), "alice").await;

        let stored = store.get("basic-data", "tenant-x", "alice").await.unwrap();
        assert_eq!(stored.payload, payload);
        assert_eq!(stored.requested_by, "alice");
        assert_eq!(stored.endpoint, "basic-data");
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_entry() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "tenant-x", json!({"v": 1}), "alice").await;
        store.save("basic-data", "tenant-x", json!({"v": 2}), "alice").await;

        assert_eq!(store.len(), 1);
        let stored = store.get("basic-data", "tenant-x", "alice").await.unwrap();
        assert_eq!(stored.payload, json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let result = store.get("basic-data", "nobody", "alice").await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_get() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "tenant-x", json!({}), "alice").await;
        backdate(&mut store, "basic-data", "tenant-x", 31);

        let result = store.get("basic-data", "tenant-x", "alice").await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
        assert!(store.is_empty(), "expired entry should be physically removed");
        assert_eq!(store.stats().total, 0);
    }

    #[tokio::test]
    async fn test_entry_visible_within_ttl() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "tenant-x", json!({"d": 1}), "alice").await;
        backdate(&mut store, "basic-data", "tenant-x", 29);

        assert!(store.get("basic-data", "tenant-x", "alice").await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_entry_is_forbidden() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "tenant-x", json!({"secret": true}), "alice").await;

        let result = store.get("basic-data", "tenant-x", "bob").await;
        match result {
            Err(GatewayError::Forbidden(msg)) => {
                assert!(!msg.contains("secret"), "error must not leak the payload");
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_all_filters_by_endpoint_and_owner() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "t1", json!({"n": 1}), "alice").await;
        store.save("basic-data", "t2", json!({"n": 2}), "bob").await;
        store.save("orders", "t1", json!({"n": 3}), "alice").await;

        let all = store.get_all("basic-data", "alice").await;
        assert_eq!(all.len(), 1);
        assert_eq!(all["t1"].payload, json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_get_all_drops_expired_entries() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "t1", json!({"n": 1}), "alice").await;
        store.save("basic-data", "t2", json!({"n": 2}), "alice").await;
        backdate(&mut store, "basic-data", "t2", 31);

        let all = store.get_all("basic-data", "alice").await;
        assert_eq!(all.len(), 1);
        assert_eq!(store.len(), 1, "expired entry should have been dropped");
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "t1", json!({}), "alice").await;
        store.save("basic-data", "t2", json!({}), "alice").await;
        store.save("orders", "t1", json!({}), "alice").await;
        backdate(&mut store, "basic-data", "t2", 31);
        backdate(&mut store, "orders", "t1", 40);

        assert_eq!(store.cleanup().await, 2);
        assert_eq!(store.len(), 1);
        // A second pass has nothing left to do
        assert_eq!(store.cleanup().await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_across_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_requests.json");

        let before = {
            let mut store = LastRequestStore::load(&path, DEFAULT_TTL_DAYS);
            store
                .save("basic-data", "tenant-x", json!({"start_date": "2025-01-01"}), "alice")
                .await;
            store.get("basic-data", "tenant-x", "alice").await.unwrap()
        };

        let mut reloaded = LastRequestStore::load(&path, DEFAULT_TTL_DAYS);
        let after = reloaded.get("basic-data", "tenant-x", "alice").await.unwrap();

        assert_eq!(after.payload, before.payload);
        assert_eq!(after.timestamp, before.timestamp);
        assert_eq!(after.requested_by, "alice");
    }

    #[tokio::test]
    async fn test_load_filters_expired_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_requests.json");

        {
            let mut store = LastRequestStore::load(&path, DEFAULT_TTL_DAYS);
            store.save("basic-data", "fresh", json!({}), "alice").await;
            store.save("basic-data", "old", json!({}), "alice").await;
            backdate(&mut store, "basic-data", "old", 31);
            // Rewrite the snapshot with the backdated timestamp included
            store.persist().await;
        }

        let reloaded = LastRequestStore::load(&path, DEFAULT_TTL_DAYS);
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_requests.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = LastRequestStore::load(&path, DEFAULT_TTL_DAYS);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.save("basic-data", "t1", json!({}), "alice").await;

        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        store.save("basic-data", "t1", json!({}), "alice").await;
        store.save("basic-data", "t2", json!({}), "alice").await;
        backdate(&mut store, "basic-data", "t2", 31);

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.ttl_days, 30);
        assert!(stats.backing_file_bytes > 0);
    }
}
