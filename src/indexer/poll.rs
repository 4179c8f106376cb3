//! The poll loop
//!
//! A single long-lived task drives the whole pipeline: every tick it submits
//! one listing job to the fetch pool, reports progress, and sleeps. Nothing
//! else triggers a frontier scan.

use crate::indexer::scheduler::FetchPool;
use crate::storage::{Storage, StoreHandle};
use crate::DriftError;
use std::sync::Arc;
use std::time::Duration;

/// Runs the poll loop forever
///
/// Returns only on a store failure, which is fatal for the process.
pub async fn run(
    pool: FetchPool,
    store: Arc<StoreHandle>,
    interval: Duration,
) -> Result<(), DriftError> {
    loop {
        pool.submit_listing().await;

        let indexed = store.with(|s| s.count_releases())?;
        tracing::info!(
            "Checking for new releases. {} releases indexed. Jobs {}",
            indexed,
            pool.backlog()
        );

        tokio::time::sleep(interval).await;
    }
}
