//! Cache Module
//!
//! TTL-scoped result caches keyed by canonicalized request parameters.
//!
//! One [`CacheNamespace`] exists per report family, each with its own TTL;
//! the [`CacheRegistry`] is the fixed process-wide collection of them.

mod entry;
mod fingerprint;
mod namespace;
mod registry;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use fingerprint::fingerprint;
pub use namespace::{CacheNamespace, FlushExpiredStats, FlushStats, NamespaceStats};
pub use registry::CacheRegistry;
