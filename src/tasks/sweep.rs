//! Expiry Sweep Task
//!
//! Background task that periodically reclaims expired cache entries, so
//! memory held by stale responses is released even when no `put` arrives.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::SharedCache;

/// Spawns a background task that evicts expired entries every `interval`.
///
/// Each run locks the cache only for the duration of the sweep, which
/// stops at the first unexpired entry.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_expiry_sweep(cache: SharedCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().await.evict_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
