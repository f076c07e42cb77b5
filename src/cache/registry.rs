//! Cache Registry Module
//!
//! The fixed, process-wide collection of named cache namespaces, one per
//! report family, each with its own TTL. Built once at startup by the
//! composition root and injected everywhere it is needed; never grows or
//! shrinks afterwards, only flushed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::namespace::{CacheNamespace, FlushExpiredStats, FlushStats, NamespaceStats};
use crate::error::{GatewayError, Result};
use crate::reports::families;

// == Cache Registry ==
/// Named collection of independent cache namespaces.
///
/// Each namespace carries its own lock; concurrent request handlers share
/// the same instances through `Arc`.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    namespaces: HashMap<String, Arc<RwLock<CacheNamespace>>>,
}

impl CacheRegistry {
    // == Constructors ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry with the default report families and their
    /// production TTLs.
    pub fn with_default_families() -> Self {
        let mut registry = Self::new();
        for (name, ttl) in families::DEFAULT_TTLS {
            // Names are distinct constants, registration cannot fail here.
            let _ = registry.register(name, ttl);
        }
        registry
    }

    // == Register ==
    /// Adds a namespace. Rejects duplicate names so wiring mistakes surface
    /// at startup instead of silently splitting a family across two stores.
    pub fn register(&mut self, name: &str, ttl: Duration) -> Result<()> {
        if self.namespaces.contains_key(name) {
            return Err(GatewayError::Internal(format!(
                "cache namespace '{}' registered twice",
                name
            )));
        }
        self.namespaces.insert(
            name.to_string(),
            Arc::new(RwLock::new(CacheNamespace::new(name, ttl))),
        );
        Ok(())
    }

    // == Lookup ==
    /// Returns the shared handle for a namespace, if configured.
    pub fn namespace(&self, name: &str) -> Option<Arc<RwLock<CacheNamespace>>> {
        self.namespaces.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Configured namespace names in stable order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.keys().cloned().collect();
        names.sort();
        names
    }

    // == Fan-out Operations ==
    /// Flushes every namespace; results aggregated by namespace name.
    pub async fn flush_all(&self) -> BTreeMap<String, FlushStats> {
        let mut out = BTreeMap::new();
        for (name, ns) in &self.namespaces {
            out.insert(name.clone(), ns.write().await.flush());
        }
        out
    }

    /// Removes expired entries from every namespace.
    pub async fn flush_expired_all(&self) -> BTreeMap<String, FlushExpiredStats> {
        let mut out = BTreeMap::new();
        for (name, ns) in &self.namespaces {
            out.insert(name.clone(), ns.write().await.flush_expired());
        }
        out
    }

    /// Read-only stats snapshot across every namespace.
    pub async fn stats_all(&self) -> BTreeMap<String, NamespaceStats> {
        let mut out = BTreeMap::new();
        for (name, ns) in &self.namespaces {
            out.insert(name.clone(), ns.read().await.stats());
        }
        out
    }
}
