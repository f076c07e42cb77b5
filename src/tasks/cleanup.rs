//! Cleanup Task Module
//!
//! Periodic background sweep over the cache namespaces and the
//! last-request store. Expired cache entries are also dropped lazily on
//! read; the sweep bounds how long dead entries can linger without being
//! touched.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::service::Gateway;

// == Cleanup Task ==
/// Spawns the background sweep, returning its handle so the caller can
/// abort it on shutdown.
pub fn spawn_cleanup_task(gateway: Arc<Gateway>, interval_secs: u64) -> JoinHandle<()> {
    info!(interval_secs, "starting background cleanup task");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it so startup stays quiet
        interval.tick().await;

        loop {
            interval.tick().await;

            let cache_stats = gateway.caches().flush_expired_all().await;
            let expired: usize = cache_stats.values().map(|s| s.expired).sum();

            let store = gateway.last_requests();
            let removed = store.write().await.cleanup().await;

            if expired > 0 || removed > 0 {
                info!(
                    cache_entries = expired,
                    stored_requests = removed,
                    "cleanup sweep removed expired data"
                );
            } else {
                debug!("cleanup sweep found nothing expired");
            }
        }
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheRegistry;
    use crate::replay::{EndpointRegistry, LastRequestStore, DEFAULT_TTL_DAYS};
    use tempfile::TempDir;

    fn empty_gateway(dir: &TempDir) -> Arc<Gateway> {
        Arc::new(
            Gateway::new(
                CacheRegistry::with_default_families(),
                LastRequestStore::load(dir.path().join("last_requests.json"), DEFAULT_TTL_DAYS),
                EndpointRegistry::new(),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_spawn_returns_abortable_handle() {
        let dir = TempDir::new().unwrap();
        let handle = spawn_cleanup_task(empty_gateway(&dir), 3600);

        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_on_interval() {
        let dir = TempDir::new().unwrap();
        let gateway = empty_gateway(&dir);
        let handle = spawn_cleanup_task(Arc::clone(&gateway), 1);

        // Two paused-clock intervals are enough to prove the loop survives
        // consecutive sweeps over empty state
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
