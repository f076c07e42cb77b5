//! API Handlers Module
//!
//! Axum handlers for the report, replay, and admin endpoints. The handlers
//! stay thin: identity comes from the upstream auth proxy via the
//! `x-authenticated-user` header, and all real work happens in the gateway
//! service.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::Json;
use serde_json::Value;
use tracing::info;

use crate::error::{GatewayError, Result};
use crate::models::{
    CacheFlushExpiredResponse, CacheFlushResponse, CacheStatsResponse, CleanupResponse,
    HealthResponse, LastRequestsResponse, NamespaceQuery, ReplayRequest, ReportResponse,
    StoreStatsResponse,
};
use crate::service::Gateway;

/// Header populated by the upstream auth proxy with the verified caller
/// identity.
pub const IDENTITY_HEADER: &str = "x-authenticated-user";

// == App State ==
/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

// == Caller Extractor ==
/// The authenticated caller, extracted from [`IDENTITY_HEADER`].
///
/// Requests that reach this service without the header did not pass through
/// the auth proxy and are rejected.
pub struct Caller(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let caller = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(GatewayError::Unauthorized)?;
        Ok(Caller(caller.to_string()))
    }
}

// == Report Handlers ==
/// POST /reports/:endpoint - runs a report through the cached path.
pub async fn run_report(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Caller(caller): Caller,
    Json(payload): Json<Value>,
) -> Result<Json<ReportResponse>> {
    let response = state.gateway.run_report(&endpoint, &caller, payload).await?;
    Ok(Json(response))
}

/// POST /reports/:endpoint/replay - re-executes the caller's last stored
/// request for the given tenant.
pub async fn replay_report(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Caller(caller): Caller,
    Json(request): Json<ReplayRequest>,
) -> Result<Json<ReportResponse>> {
    let response = state
        .gateway
        .replay_last_request(&endpoint, &request.tenant, &caller)
        .await?;
    Ok(Json(response))
}

/// GET /last-requests/:endpoint - the caller's stored requests for an
/// endpoint, keyed by tenant.
pub async fn list_last_requests(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    Caller(caller): Caller,
) -> Json<LastRequestsResponse> {
    let requests = state.gateway.list_last_requests(&endpoint, &caller).await;
    Json(LastRequestsResponse {
        endpoint,
        total: requests.len(),
        requests,
    })
}

// == Cache Admin Handlers ==
/// GET /admin/cache/stats - per-namespace cache statistics, optionally
/// scoped to one namespace.
pub async fn cache_stats(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<CacheStatsResponse>> {
    let caches = state.gateway.caches();
    let stats = match query.namespace {
        Some(name) => {
            let ns = caches
                .namespace(&name)
                .ok_or_else(|| GatewayError::UnsupportedEndpoint(name.clone()))?;
            let stats = ns.read().await.stats();
            std::iter::once((name, stats)).collect()
        }
        None => caches.stats_all().await,
    };
    Ok(Json(CacheStatsResponse { stats }))
}

/// POST /admin/cache/flush - empties every namespace, or the named one.
pub async fn cache_flush(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<CacheFlushResponse>> {
    let caches = state.gateway.caches();
    let (message, stats) = match query.namespace {
        Some(name) => {
            let ns = caches
                .namespace(&name)
                .ok_or_else(|| GatewayError::UnsupportedEndpoint(name.clone()))?;
            let stats = ns.write().await.flush();
            info!(namespace = %name, by = %caller, removed = stats.removed, "cache flushed");
            (
                format!("Flushed namespace '{}'", name),
                std::iter::once((name, stats)).collect(),
            )
        }
        None => {
            let stats = caches.flush_all().await;
            info!(by = %caller, "all cache namespaces flushed");
            ("Flushed all namespaces".to_string(), stats)
        }
    };
    Ok(Json(CacheFlushResponse { message, stats }))
}

/// POST /admin/cache/flush-expired - drops only expired entries.
pub async fn cache_flush_expired(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<NamespaceQuery>,
) -> Result<Json<CacheFlushExpiredResponse>> {
    let caches = state.gateway.caches();
    let (message, stats) = match query.namespace {
        Some(name) => {
            let ns = caches
                .namespace(&name)
                .ok_or_else(|| GatewayError::UnsupportedEndpoint(name.clone()))?;
            let stats = ns.write().await.flush_expired();
            info!(namespace = %name, by = %caller, expired = stats.expired, "expired entries flushed");
            (
                format!("Flushed expired entries in '{}'", name),
                std::iter::once((name, stats)).collect(),
            )
        }
        None => {
            let stats = caches.flush_expired_all().await;
            info!(by = %caller, "expired entries flushed in all namespaces");
            ("Flushed expired entries in all namespaces".to_string(), stats)
        }
    };
    Ok(Json(CacheFlushExpiredResponse { message, stats }))
}

// == Store Admin Handlers ==
/// GET /admin/last-requests/stats
pub async fn store_stats(
    State(state): State<AppState>,
    Caller(_caller): Caller,
) -> Json<StoreStatsResponse> {
    let store = state.gateway.last_requests();
    let stats = store.read().await.stats();
    Json(StoreStatsResponse { stats })
}

/// POST /admin/last-requests/cleanup - drops expired stored requests now.
pub async fn store_cleanup(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Json<CleanupResponse> {
    let store = state.gateway.last_requests();
    let removed = store.write().await.cleanup().await;
    info!(by = %caller, removed, "last-request store cleanup");
    Json(CleanupResponse { removed })
}

// == Health Handler ==
/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
