//! Gateway Service Module
//!
//! The composition root of the caching and replay core: owns the cache
//! registry, the last-request store, and the endpoint registry, and wires
//! the read-through flow every report request takes.
//!
//! Flow on a report run: validate the payload against the endpoint's typed
//! shape, check the family's cache namespace, and on a miss invoke the
//! external fetch operation; a successful fetch populates the cache and
//! records the request for later replay, a failed fetch mutates nothing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::CacheRegistry;
use crate::error::{GatewayError, Result};
use crate::models::{ReplayMeta, ReportResponse, ResultSource};
use crate::replay::{EndpointRegistry, ErasedEndpoint, LastRequestStore, StoredRequest};
use crate::reports::TenantContext;

// == Cache Key Scope ==
/// Extends a canonical payload with the caller identity for cache-key
/// purposes. The stored last request keeps the unscoped payload; only the
/// cache key carries the caller, since access control resolves per user.
fn caller_scoped(canonical: &Value, caller: &str) -> Value {
    let mut params = canonical.clone();
    if let Value::Object(map) = &mut params {
        map.insert("caller".to_string(), Value::String(caller.to_string()));
    }
    params
}

// == Gateway ==
/// Process-wide shared state for the caching and replay core.
///
/// Created once at startup and shared across request handlers via `Arc`;
/// tests construct isolated instances.
pub struct Gateway {
    caches: CacheRegistry,
    last_requests: Arc<RwLock<LastRequestStore>>,
    endpoints: EndpointRegistry,
}

impl Gateway {
    // == Constructor ==
    /// Wires the core together, checking at startup that every registered
    /// endpoint has a cache namespace configured for its family.
    pub fn new(
        caches: CacheRegistry,
        last_requests: LastRequestStore,
        endpoints: EndpointRegistry,
    ) -> Result<Self> {
        for endpoint in endpoints.endpoints() {
            if !caches.contains(endpoint) {
                return Err(GatewayError::Internal(format!(
                    "endpoint '{}' has no cache namespace configured",
                    endpoint
                )));
            }
        }
        Ok(Self {
            caches,
            last_requests: Arc::new(RwLock::new(last_requests)),
            endpoints,
        })
    }

    pub fn caches(&self) -> &CacheRegistry {
        &self.caches
    }

    pub fn last_requests(&self) -> Arc<RwLock<LastRequestStore>> {
        Arc::clone(&self.last_requests)
    }

    // == Run Report ==
    /// Executes a report request through the cached path.
    ///
    /// If the payload carries the `replay_last` flag, the run is delegated
    /// to [`Gateway::replay_last_request`] for the request's tenant instead
    /// of executing the payload itself.
    pub async fn run_report(
        &self,
        endpoint: &str,
        caller: &str,
        payload: Value,
    ) -> Result<ReportResponse> {
        let entry = self.endpoints.entry(endpoint)?;
        let parsed = entry.parse(payload)?;

        if parsed.replay_requested {
            return self.replay_last_request(endpoint, &parsed.tenant, caller).await;
        }

        let namespace = self
            .caches
            .namespace(endpoint)
            .ok_or_else(|| GatewayError::UnsupportedEndpoint(endpoint.to_string()))?;

        // Per-caller access control can change which rows a query returns,
        // so cached results are keyed by caller as well as by the request.
        let cache_params = caller_scoped(&parsed.canonical, caller);

        // Check the cache, releasing the lock before the slow fetch path
        {
            let mut ns = namespace.write().await;
            if let Some(hit) = ns.get(&cache_params)? {
                debug!(endpoint, tenant = %parsed.tenant, "cache hit");
                return Ok(ReportResponse {
                    source: ResultSource::Cache,
                    data: hit,
                    replay: None,
                });
            }
        }

        debug!(endpoint, tenant = %parsed.tenant, "cache miss, fetching");
        let ctx = TenantContext {
            tenant: parsed.tenant.clone(),
            caller: caller.to_string(),
        };
        let data = entry.fetch(&ctx, &parsed.canonical).await?;

        // Fetch succeeded: populate the cache and record the request
        {
            let mut ns = namespace.write().await;
            ns.set(&cache_params, data.clone())?;
        }
        {
            let mut store = self.last_requests.write().await;
            store
                .save(endpoint, &parsed.tenant, parsed.canonical.clone(), caller)
                .await;
        }

        Ok(ReportResponse {
            source: ResultSource::Database,
            data,
            replay: None,
        })
    }

    // == Replay Last Request ==
    /// Re-executes the caller's most recent stored request for
    /// `(endpoint, tenant)` and attaches replay metadata to the result.
    ///
    /// Authorization of the fetch itself uses the current caller's context;
    /// the original requester only gates visibility of the stored request.
    pub async fn replay_last_request(
        &self,
        endpoint: &str,
        tenant: &str,
        caller: &str,
    ) -> Result<ReportResponse> {
        let stored: StoredRequest = {
            let mut store = self.last_requests.write().await;
            store.get(endpoint, tenant, caller).await?
        };

        info!(endpoint, tenant, "replaying last request");
        let ctx = TenantContext {
            tenant: stored.tenant.clone(),
            caller: caller.to_string(),
        };
        let data = self
            .endpoints
            .replay(endpoint, stored.payload.clone(), &ctx)
            .await?;

        Ok(ReportResponse {
            source: ResultSource::Replay,
            data,
            replay: Some(ReplayMeta {
                endpoint: stored.endpoint,
                tenant: stored.tenant,
                payload: stored.payload,
                requested_by: stored.requested_by,
                original_timestamp: stored.timestamp,
                executed_at: Utc::now(),
            }),
        })
    }

    // == List Last Requests ==
    /// The caller's stored requests for one endpoint, keyed by tenant.
    pub async fn list_last_requests(
        &self,
        endpoint: &str,
        caller: &str,
    ) -> BTreeMap<String, StoredRequest> {
        let mut store = self.last_requests.write().await;
        store.get_all(endpoint, caller).await
    }
}
