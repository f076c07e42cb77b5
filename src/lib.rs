//! # Metrics Gateway
//!
//! Caching and request-replay core for a multi-tenant analytics API:
//! order-independent fingerprinting of report parameters, TTL cache
//! namespaces per report family, a persistent per-tenant last-request store,
//! and typed replay dispatch.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod replay;
pub mod reports;
pub mod service;
pub mod tasks;

pub use api::{create_router, AppState, Caller, IDENTITY_HEADER};
pub use cache::{CacheNamespace, CacheRegistry};
pub use config::Config;
pub use error::{GatewayError, Result};
pub use replay::{EndpointRegistry, LastRequestStore, StoredRequest};
pub use service::Gateway;
pub use tasks::spawn_cleanup_task;
