//! TTL Expiry Sweep Task
//!
//! Background task that periodically purges expired documents from every
//! registered collection.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::registry::Registry;

/// Spawns a background task that periodically purges expired documents.
///
/// Each pass takes every collection's write lock in turn, so a concurrent
/// `get` sees a collection either before or after its purge, never midway.
///
/// # Arguments
/// * `registry` - Registry whose collections are swept; collections
///   created after the task starts are picked up on the next pass
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let registry = Registry::new();
/// let sweep_handle = spawn_expiry_task(registry.clone(), 1);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_expiry_task(registry: Registry, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL expiry task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut removed = 0;
            for collection in registry.collections().await {
                let purged = collection.purge_expired().await;
                if purged > 0 {
                    debug!("TTL sweep: '{}' purged {} documents", collection.name(), purged);
                }
                removed += purged;
            }

            if removed > 0 {
                info!("TTL sweep: removed {} expired documents", removed);
            } else {
                debug!("TTL sweep: no expired documents found");
            }
        }
    })
}
