//! Metrics Gateway server binary.
//!
//! Wires the caching and replay core to an HTTP surface:
//!
//! 1. Initialize the tracing subscriber
//! 2. Load configuration from environment variables
//! 3. Load the last-request store from disk
//! 4. Register the report families and their cache namespaces
//! 5. Start the background cleanup sweep
//! 6. Serve with graceful shutdown on SIGINT/SIGTERM

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_gateway::api::{create_router, AppState};
use metrics_gateway::cache::CacheRegistry;
use metrics_gateway::config::Config;
use metrics_gateway::replay::{EndpointRegistry, LastRequestStore};
use metrics_gateway::reports::{
    BasicDataRequest, DailyMetricsRequest, DetailedDataRequest, OrdersRequest, ReportFetch,
    ReportRequest, TenantContext, TrafficCategoriesRequest,
};
use metrics_gateway::service::Gateway;
use metrics_gateway::tasks::spawn_cleanup_task;

// == Sample Fetch ==
/// Stand-in fetch operation used when the gateway runs without a warehouse
/// connection: echoes the request back as a single sample row so the full
/// caching and replay path stays exercisable.
struct SampleFetch;

#[async_trait]
impl<R: ReportRequest> ReportFetch<R> for SampleFetch {
    async fn fetch(&self, ctx: &TenantContext, request: &R) -> metrics_gateway::Result<Value> {
        let params = serde_json::to_value(request)
            .map_err(|e| metrics_gateway::GatewayError::Encoding(e.to_string()))?;
        Ok(json!({
            "sample": true,
            "tenant": ctx.tenant,
            "endpoint": R::ENDPOINT,
            "rows": [params],
        }))
    }
}

fn build_endpoints() -> metrics_gateway::Result<EndpointRegistry> {
    let mut endpoints = EndpointRegistry::new();
    endpoints.register::<BasicDataRequest, _>(SampleFetch)?;
    endpoints.register::<DailyMetricsRequest, _>(SampleFetch)?;
    endpoints.register::<OrdersRequest, _>(SampleFetch)?;
    endpoints.register::<DetailedDataRequest, _>(SampleFetch)?;
    endpoints.register::<TrafficCategoriesRequest, _>(SampleFetch)?;
    Ok(endpoints)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metrics_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Metrics Gateway");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, last_request_file={}, ttl_days={}, cleanup_interval={}s",
        config.server_port,
        config.last_request_file.display(),
        config.last_request_ttl_days,
        config.cleanup_interval_secs
    );

    let store = LastRequestStore::load(&config.last_request_file, config.last_request_ttl_days);
    info!(entries = store.len(), "Last-request store loaded");

    let gateway = Arc::new(Gateway::new(
        CacheRegistry::with_default_families(),
        store,
        build_endpoints()?,
    )?);
    info!("Cache namespaces and report endpoints registered");

    let cleanup_handle = spawn_cleanup_task(Arc::clone(&gateway), config.cleanup_interval_secs);

    let app = create_router(AppState { gateway });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then aborts the cleanup task so the server
/// can drain and exit.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
