//! Indexer module: the frontier/fetch/parse pipeline
//!
//! This module contains the core indexing logic, including:
//! - Listing frontier scanning
//! - Bounded-concurrency fetching with retry
//! - Detail-page parsing and persistence
//! - The periodic poll loop

mod detail;
mod fetcher;
mod frontier;
mod poll;
mod scheduler;

pub use detail::{index_detail, parse_detail, DetailDraft};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome};
pub use frontier::{newest_listed_id, FrontierScan};
pub use scheduler::FetchPool;

use crate::config::Config;
use crate::storage::{SqliteStorage, StoreHandle};
use crate::DriftError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Runs the indexer until a fatal error
///
/// This is the main entry point for indexing. It will:
/// 1. Open the record store (creating the schema if needed)
/// 2. Build the HTTP client
/// 3. Start the bounded fetch pool
/// 4. Drive the poll loop indefinitely
///
/// # Arguments
///
/// * `config` - The indexer configuration
///
/// # Returns
///
/// * `Err(DriftError)` - An unrecoverable condition ended the run
pub async fn run_indexer(config: Config) -> Result<(), DriftError> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let store = Arc::new(StoreHandle::new(storage));

    let client = build_http_client(&config.fetch)?;
    let interval = Duration::from_secs(config.poll.interval_secs);

    let pool = FetchPool::new(Arc::new(config), client, Arc::clone(&store));

    poll::run(pool, store, interval).await
}
