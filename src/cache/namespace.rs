//! Cache Namespace Module
//!
//! An independently configured, TTL-scoped result cache for one report
//! family. Keys are fingerprints of the canonicalized request parameters;
//! expiry is validated lazily on every read, so correctness never depends on
//! a background sweep.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::cache::entry::CacheEntry;
use crate::cache::fingerprint::fingerprint;
use crate::error::Result;

// == Operation Stats ==
/// What a full flush removed.
#[derive(Debug, Clone, Serialize)]
pub struct FlushStats {
    /// Number of entries removed
    pub removed: usize,
    /// Keys that were removed
    pub keys: Vec<String>,
}

/// What an expired-only flush removed and what stayed behind.
#[derive(Debug, Clone, Serialize)]
pub struct FlushExpiredStats {
    /// Number of expired entries removed
    pub expired: usize,
    /// Number of valid entries left untouched
    pub remaining: usize,
}

/// Read-only snapshot of a namespace for operational visibility.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStats {
    /// All physically present entries, valid or not
    pub total: usize,
    /// Entries still within the TTL
    pub valid: usize,
    /// Entries past the TTL awaiting removal
    pub expired: usize,
    /// Namespace TTL in seconds
    pub ttl_secs: u64,
    /// Approximate in-memory size (JSON serialization length)
    pub approx_size_bytes: usize,
}

// == Cache Namespace ==
/// TTL-scoped key-value store for one report family.
#[derive(Debug)]
pub struct CacheNamespace {
    name: String,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl CacheNamespace {
    // == Constructor ==
    pub fn new(name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            name: name.into(),
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Get ==
    /// Looks up the cached value for a parameter set.
    ///
    /// Returns `None` on a miss. A stale entry found on the way is removed
    /// (lazy expiry) and reported as a miss. The only error condition is a
    /// parameter set that cannot be fingerprinted.
    pub fn get<T: Serialize>(&mut self, params: &T) -> Result<Option<Value>> {
        let key = fingerprint(params)?;
        match self.entries.get(&key) {
            Some(entry) if !entry.is_expired(self.ttl) => Ok(Some(entry.value.clone())),
            Some(_) => {
                self.entries.remove(&key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    // == Set ==
    /// Inserts or overwrites the cached value for a parameter set with
    /// `created_at = now`. Overwriting is intentional (refreshed data).
    pub fn set<T: Serialize>(&mut self, params: &T, value: Value) -> Result<()> {
        let key = fingerprint(params)?;
        self.entries.insert(key, CacheEntry::new(value));
        Ok(())
    }

    // == Flush ==
    /// Unconditionally empties the namespace and reports what was removed.
    pub fn flush(&mut self) -> FlushStats {
        let keys: Vec<String> = self.entries.keys().cloned().collect();
        self.entries.clear();
        FlushStats {
            removed: keys.len(),
            keys,
        }
    }

    // == Flush Expired ==
    /// Removes only entries whose age has reached the TTL.
    pub fn flush_expired(&mut self) -> FlushExpiredStats {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| !entry.is_expired(ttl));
        FlushExpiredStats {
            expired: before - self.entries.len(),
            remaining: self.entries.len(),
        }
    }

    // == Stats ==
    /// Read-only snapshot; never mutates the namespace.
    pub fn stats(&self) -> NamespaceStats {
        let expired = self
            .entries
            .values()
            .filter(|e| e.is_expired(self.ttl))
            .count();
        NamespaceStats {
            total: self.entries.len(),
            valid: self.entries.len() - expired,
            expired,
            ttl_secs: self.ttl.as_secs(),
            approx_size_bytes: serde_json::to_string(&self.entries)
                .map(|s| s.len())
                .unwrap_or(0),
        }
    }

    // == Length ==
    /// Physically present entries, including stale ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
