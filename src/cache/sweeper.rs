//! Background expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;

use crate::cache::CacheStore;

/// Run `cleanup` every `interval` until shutdown is signalled.
pub fn spawn_sweeper(
    cache: Arc<CacheStore>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = interval.as_secs(), "Cache sweeper starting");
        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.cleanup();
                    if removed > 0 {
                        tracing::debug!(removed, "Cache sweep removed expired entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cache sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheOptions;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn test_sweeper_removes_expired_and_stops() {
        let cache = Arc::new(CacheStore::in_memory(Duration::from_secs(60)));
        cache.set("short", &1, CacheOptions::ttl(Duration::from_millis(10)));
        cache.set("long", &2, CacheOptions::default());

        let shutdown = Shutdown::new();
        let handle = spawn_sweeper(cache.clone(), Duration::from_millis(30), shutdown.subscribe());

        tokio::time::sleep(Duration::from_millis(100)).await;
        // Swept without any read touching the key
        assert_eq!(cache.len(), 1);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
