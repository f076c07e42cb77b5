//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{FlushExpiredStats, FlushStats, NamespaceStats};
use crate::replay::{StoreStats, StoredRequest};

// == Result Source ==
/// Where a report result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Served from the in-memory namespace without touching the warehouse
    Cache,
    /// Fetched live and stored back into the cache
    Database,
    /// Re-executed from a stored last request
    Replay,
}

// == Replay Metadata ==
/// Attached to a result when it was produced by replaying a stored request.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayMeta {
    pub endpoint: String,
    pub tenant: String,
    /// The stored payload that was re-executed
    pub payload: Value,
    /// Principal that issued the original request
    pub requested_by: String,
    pub original_timestamp: DateTime<Utc>,
    pub executed_at: DateTime<Utc>,
}

// == Report Response ==
/// Result of a report run, cached or live or replayed.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub source: ResultSource,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplayMeta>,
}

// == Last Requests Listing ==
/// Response body for GET /last-requests/:endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LastRequestsResponse {
    pub endpoint: String,
    pub total: usize,
    /// Stored requests keyed by tenant
    pub requests: BTreeMap<String, StoredRequest>,
}

// == Cache Maintenance ==
/// Response body for POST /admin/cache/flush
#[derive(Debug, Clone, Serialize)]
pub struct CacheFlushResponse {
    pub message: String,
    pub stats: BTreeMap<String, FlushStats>,
}

/// Response body for POST /admin/cache/flush-expired
#[derive(Debug, Clone, Serialize)]
pub struct CacheFlushExpiredResponse {
    pub message: String,
    pub stats: BTreeMap<String, FlushExpiredStats>,
}

/// Response body for GET /admin/cache/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub stats: BTreeMap<String, NamespaceStats>,
}

// == Last Request Store Maintenance ==
/// Response body for GET /admin/last-requests/stats
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatsResponse {
    pub stats: StoreStats,
}

/// Response body for POST /admin/last-requests/cleanup
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub removed: usize,
}

// == Health ==
/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_source_serializes_snake_case() {
        assert_eq!(serde_json::to_value(ResultSource::Cache).unwrap(), json!("cache"));
        assert_eq!(
            serde_json::to_value(ResultSource::Database).unwrap(),
            json!("database")
        );
        assert_eq!(serde_json::to_value(ResultSource::Replay).unwrap(), json!("replay"));
    }

    #[test]
    fn test_report_response_omits_absent_replay_meta() {
        let resp = ReportResponse {
            source: ResultSource::Cache,
            data: json!({"rows": []}),
            replay: None,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("replay").is_none());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
