//! Background cleanup task: purge old soft-deleted records.

use crate::server::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

pub fn spawn_cleanup_task(
    engine: Arc<Engine>,
    retention: chrono::Duration,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            interval.tick().await;
            if let Err(e) = run_cleanup(&engine, retention) {
                tracing::error!("Cleanup error: {}", e);
            }
        }
    })
}

fn run_cleanup(engine: &Engine, retention: chrono::Duration) -> lockbox_core::Result<usize> {
    let purged = engine.purge_deleted(retention)?;
    tracing::debug!("Cleanup completed, {} record(s) purged", purged);
    Ok(purged)
}
