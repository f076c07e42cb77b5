//! Report Seam Module
//!
//! The boundary between the caching/replay core and the report fetch
//! operations that actually query the warehouse. The core only ever sees
//! typed request shapes and the [`ReportFetch`] trait; SQL construction,
//! authentication, and the warehouse client live on the other side of it.

pub mod requests;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

pub use requests::{
    BasicDataRequest, DailyMetricsRequest, DetailedDataRequest, OrdersRequest,
    TrafficCategoriesRequest,
};

// == Report Families ==
/// Endpoint identifiers for the report families the service maintains,
/// together with their cache TTLs.
pub mod families {
    use std::time::Duration;

    pub const BASIC_DATA: &str = "basic-data";
    pub const DAILY_METRICS: &str = "daily-metrics";
    pub const ORDERS: &str = "orders";
    pub const DETAILED_DATA: &str = "detailed-data";
    pub const TRAFFIC_CATEGORIES: &str = "traffic-categories";

    /// Default namespace TTLs per family. Volatile order data refreshes
    /// every 15 minutes; near-static traffic category rules live a week.
    pub const DEFAULT_TTLS: [(&str, Duration); 5] = [
        (BASIC_DATA, Duration::from_secs(60 * 60)),
        (DAILY_METRICS, Duration::from_secs(60 * 60)),
        (ORDERS, Duration::from_secs(15 * 60)),
        (DETAILED_DATA, Duration::from_secs(4 * 60 * 60)),
        (TRAFFIC_CATEGORIES, Duration::from_secs(7 * 24 * 60 * 60)),
    ];
}

// == Tenant Context ==
/// The scope a fetch operation runs under, supplied by the external
/// authentication layer. `caller` is an opaque principal identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant: String,
    pub caller: String,
}

// == Report Request ==
/// A typed, per-family request shape.
///
/// Every request carries the tenant it targets and a `replay_last` flag
/// ("re-run my most recent request instead of this one"). The replay
/// dispatcher forces that flag off before re-invoking a fetch, which is
/// what keeps replay from recursing.
pub trait ReportRequest: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The endpoint identifier this request shape belongs to.
    const ENDPOINT: &'static str;

    fn tenant(&self) -> &str;

    fn replay_requested(&self) -> bool;

    fn clear_replay_flag(&mut self);
}

// == Report Fetch ==
/// A report fetch operation: the external collaborator that owns SQL
/// construction and the warehouse round trip for one family.
///
/// The cache/replay core wraps implementations of this trait; it never
/// provides one itself. Failures must be returned, never cached.
#[async_trait]
pub trait ReportFetch<R: ReportRequest>: Send + Sync {
    async fn fetch(&self, ctx: &TenantContext, request: &R) -> Result<Value>;
}
