//! Cache Entry Module
//!
//! Defines the structure for individual cached report results.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A single cached result payload with its creation time.
///
/// Entries are owned exclusively by their namespace; freshness is always
/// re-validated on read against the namespace TTL, so an entry that outlives
/// its TTL is invisible even before it is physically swept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached result payload (opaque to the cache layer)
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry with `created_at = now`.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            created_at: current_timestamp_ms(),
        }
    }

    // == Age ==
    /// Returns the entry age in milliseconds.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the entry has outlived the given TTL.
    ///
    /// Boundary condition: an entry is expired once `age >= ttl`, so an
    /// entry that is exactly as old as the TTL is already invisible.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        u128::from(self.age_ms()) >= ttl.as_millis()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
