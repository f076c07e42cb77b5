//! Replay Module
//!
//! Durable "last request per (endpoint, tenant)" storage and the dispatch
//! machinery that re-executes a stored payload through the same fetch
//! operation a live request would use.

mod dispatcher;
mod store;

// Re-export public types
pub use dispatcher::{EndpointRegistry, ParsedRequest};
pub(crate) use dispatcher::ErasedEndpoint;
pub use store::{LastRequestStore, StoreStats, StoredRequest, DEFAULT_TTL_DAYS};
