//! Typed request shapes, one per report family.
//!
//! These are the canonical parameter sets the cache fingerprints and the
//! last-request store persists. Serialization must stay stable: a field
//! rename silently invalidates every cached result for that family.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{families, ReportRequest};

fn default_attribution() -> String {
    "last-non-direct-click".to_string()
}

// == Basic Data ==
/// Daily acquisition funnel aggregated by traffic cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicDataRequest {
    pub tenant: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_attribution")]
    pub attribution_model: String,
    #[serde(default)]
    pub filters: Option<Value>,
    #[serde(default)]
    pub replay_last: bool,
}

impl ReportRequest for BasicDataRequest {
    const ENDPOINT: &'static str = families::BASIC_DATA;

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn replay_requested(&self) -> bool {
        self.replay_last
    }

    fn clear_replay_flag(&mut self) {
        self.replay_last = false;
    }
}

// == Daily Metrics ==
/// Conversion funnel counts per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMetricsRequest {
    pub tenant: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub replay_last: bool,
}

impl ReportRequest for DailyMetricsRequest {
    const ENDPOINT: &'static str = families::DAILY_METRICS;

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn replay_requested(&self) -> bool {
        self.replay_last
    }

    fn clear_replay_flag(&mut self) {
        self.replay_last = false;
    }
}

// == Orders ==
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersRequest {
    pub tenant: String,
    pub start_date: String,
    pub end_date: String,
    /// Restrict to a payment status (e.g. "paid", "authorized")
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub replay_last: bool,
}

impl ReportRequest for OrdersRequest {
    const ENDPOINT: &'static str = families::ORDERS;

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn replay_requested(&self) -> bool {
        self.replay_last
    }

    fn clear_replay_flag(&mut self) {
        self.replay_last = false;
    }
}

// == Detailed Data ==
/// Row-level export sliced by arbitrary dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedDataRequest {
    pub tenant: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub replay_last: bool,
}

impl ReportRequest for DetailedDataRequest {
    const ENDPOINT: &'static str = families::DETAILED_DATA;

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn replay_requested(&self) -> bool {
        self.replay_last
    }

    fn clear_replay_flag(&mut self) {
        self.replay_last = false;
    }
}

// == Traffic Categories ==
/// The tenant's configured traffic classification rules. Near-static, so
/// the family carries the longest cache TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficCategoriesRequest {
    pub tenant: String,
    #[serde(default)]
    pub replay_last: bool,
}

impl ReportRequest for TrafficCategoriesRequest {
    const ENDPOINT: &'static str = families::TRAFFIC_CATEGORIES;

    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn replay_requested(&self) -> bool {
        self.replay_last
    }

    fn clear_replay_flag(&mut self) {
        self.replay_last = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_data_deserialize_defaults() {
        let json = r#"{"tenant":"t1","start_date":"2025-01-01","end_date":"2025-01-31"}"#;
        let req: BasicDataRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.tenant, "t1");
        assert_eq!(req.attribution_model, "last-non-direct-click");
        assert!(req.filters.is_none());
        assert!(!req.replay_last);
    }

    #[test]
    fn test_replay_flag_round_trip() {
        let json = r#"{"tenant":"t1","start_date":"a","end_date":"b","replay_last":true}"#;
        let mut req: DailyMetricsRequest = serde_json::from_str(json).unwrap();

        assert!(req.replay_requested());
        req.clear_replay_flag();
        assert!(!req.replay_requested());

        // The cleared flag must survive re-serialization
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["replay_last"], serde_json::json!(false));
    }

    #[test]
    fn test_missing_tenant_is_rejected() {
        let json = r#"{"start_date":"2025-01-01","end_date":"2025-01-31"}"#;
        let req: Result<OrdersRequest, _> = serde_json::from_str(json);
        assert!(req.is_err());
    }
}
