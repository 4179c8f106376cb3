//! Fetch scheduling with a bounded admission pool
//!
//! Every network job (the periodic listing fetch and each detail fetch)
//! holds one admission slot from a fixed-capacity semaphore until it reaches
//! a terminal outcome. Submitters block while the pool is full, so frontier
//! scans pause under back-pressure instead of piling up unbounded work.
//!
//! Transient failures are retried against the same target with capped
//! exponential backoff up to a configured attempt ceiling; exhausting the
//! ceiling is reported and the job dropped. Not-found targets are dropped
//! immediately. A failed listing fetch is dropped too; the next poll tick
//! retries the listing on its own.

use crate::config::{Config, FetchConfig};
use crate::indexer::detail::{index_detail, parse_detail};
use crate::indexer::fetcher::{fetch_page, FetchOutcome};
use crate::indexer::frontier::{newest_listed_id, FrontierScan};
use crate::storage::StoreHandle;
use crate::DriftError;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Bounded-concurrency fetch pool
///
/// Cloning is cheap; all clones share the same slots and store.
#[derive(Clone)]
pub struct FetchPool {
    slots: Arc<Semaphore>,
    capacity: usize,
    client: Client,
    config: Arc<Config>,
    store: Arc<StoreHandle>,
}

impl FetchPool {
    /// Creates a pool with `fetch.max-in-flight` admission slots
    pub fn new(config: Arc<Config>, client: Client, store: Arc<StoreHandle>) -> Self {
        let capacity = config.fetch.max_in_flight as usize;
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            client,
            config,
            store,
        }
    }

    /// Number of admission slots currently held by in-flight jobs
    pub fn backlog(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    /// Submits the periodic listing job
    ///
    /// Blocks until an admission slot is free. The slot is released as soon
    /// as the listing response is in hand; the frontier scan that follows
    /// runs unslotted and takes fresh slots for each candidate it emits.
    pub async fn submit_listing(&self) {
        let Ok(permit) = self.slots.clone().acquire_owned().await else {
            return;
        };

        let pool = self.clone();
        tokio::spawn(async move {
            let url = pool.config.listing_url();
            tracing::debug!("Visiting {}", url);

            let outcome = fetch_page(&pool.client, &url).await;
            drop(permit);

            let body = match outcome {
                FetchOutcome::Success { body } => body,
                FetchOutcome::NotFound => {
                    tracing::warn!("Listing page not found at {}", url);
                    return;
                }
                FetchOutcome::Transient { error } => {
                    tracing::warn!("Unable to load listing page: {}", error);
                    return;
                }
            };

            if let Err(e) = pool.scan_listing(&body).await {
                tracing::error!("Listing scan aborted: {}", e);
            }
        });
    }

    /// Submits a detail-fetch job for one release id
    ///
    /// Blocks until an admission slot is free; the slot travels with the job
    /// and is released at its terminal outcome.
    pub async fn submit_detail(&self, id: i64) {
        let Ok(permit) = self.slots.clone().acquire_owned().await else {
            return;
        };

        tracing::debug!("Starting job {}", id);
        let pool = self.clone();
        tokio::spawn(async move {
            pool.run_detail_job(id).await;
            drop(permit);
        });
    }

    /// Walks the frontier of a fetched listing, submitting each candidate
    async fn scan_listing(&self, body: &str) -> Result<(), DriftError> {
        let newest = match newest_listed_id(body) {
            Ok(newest) => newest,
            Err(e) => {
                tracing::warn!("{}", e);
                return Ok(());
            }
        };
        tracing::debug!("Newest listed release id: {}", newest);

        let window = chrono::Duration::hours(self.config.poll.freshness_window_hours as i64);
        let mut scan = FrontierScan::new(&self.store, newest, window, Utc::now());

        while let Some(candidate) = scan.next() {
            self.submit_detail(candidate?).await;
        }

        Ok(())
    }

    /// Fetches, parses, and persists one release; retries transient failures
    async fn run_detail_job(&self, id: i64) {
        let url = self.config.detail_url(id);
        let mut attempt = 1u32;

        let body = loop {
            match fetch_page(&self.client, &url).await {
                FetchOutcome::Success { body } => break body,

                FetchOutcome::NotFound => {
                    tracing::debug!("{} not found", url);
                    return;
                }

                FetchOutcome::Transient { error } => {
                    if attempt >= self.config.fetch.max_attempts {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            url,
                            attempt,
                            error
                        );
                        return;
                    }
                    let delay = retry_delay(&self.config.fetch, attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        };

        let draft = match parse_detail(&body, id) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!("Skipping release {}: {}", id, e);
                return;
            }
        };

        match index_detail(&self.store, draft) {
            Ok(Some(release)) => tracing::info!("Indexed {}: {}", release.id, release.title),
            Ok(None) => tracing::debug!("Release {} already indexed by another pass", id),
            Err(e) => tracing::warn!("Skipping release {}: {}", id, e),
        }
    }
}

/// Backoff before retry `attempt + 1`: base · 2^(attempt−1), capped
fn retry_delay(config: &FetchConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let millis = config
        .retry_base_delay_ms
        .saturating_mul(1u64 << exponent)
        .min(config.retry_max_delay_ms);
    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, PollConfig, SiteConfig};
    use crate::indexer::fetcher::build_http_client;
    use crate::storage::{SqliteStorage, Storage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> Config {
        Config {
            site: SiteConfig {
                base_url: base_url.to_string(),
                listing_path: "/recent".to_string(),
                detail_path: "/torrent".to_string(),
            },
            poll: PollConfig {
                interval_secs: 60,
                freshness_window_hours: 24,
            },
            fetch: FetchConfig {
                max_in_flight: 4,
                request_timeout_secs: 5,
                connect_timeout_secs: 5,
                max_attempts: 3,
                retry_base_delay_ms: 10,
                retry_max_delay_ms: 40,
                proxy_url: None,
            },
            output: OutputConfig {
                database_path: ":memory:".to_string(),
            },
        }
    }

    fn test_pool(base_url: &str) -> FetchPool {
        let config = Arc::new(test_config(base_url));
        let client = build_http_client(&config.fetch).unwrap();
        let store = Arc::new(StoreHandle::new(SqliteStorage::new_in_memory().unwrap()));
        FetchPool::new(config, client, store)
    }

    const DETAIL_BODY: &str = r#"
        <div id="title">Sample</div>
        <div id="details">
          <dl class="col1">
            <dt>Type:</dt><dd><a href="/browse/201">Video</a></dd>
            <dt>Uploaded:</dt><dd>2024-01-02 03:04:05 UTC</dd>
            <dt>By:</dt><dd>someone</dd>
            AAAABBBBCCCCDDDDEEEEFFFF0000111122223333
          </dl>
        </div>
    "#;

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let config = test_config("http://example.onion").fetch;

        assert_eq!(retry_delay(&config, 1), Duration::from_millis(10));
        assert_eq!(retry_delay(&config, 2), Duration::from_millis(20));
        assert_eq!(retry_delay(&config, 3), Duration::from_millis(40));
        // Capped from here on
        assert_eq!(retry_delay(&config, 4), Duration::from_millis(40));
        assert_eq!(retry_delay(&config, 20), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_not_found_is_terminal_after_one_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torrent/5"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let pool = test_pool(&server.uri());
        pool.run_detail_job(5).await;

        server.verify().await;
        assert_eq!(pool.store.with(|s| s.count_releases()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_retries_same_target_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torrent/5"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/torrent/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DETAIL_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let pool = test_pool(&server.uri());
        pool.run_detail_job(5).await;

        server.verify().await;
        assert!(pool.store.with(|s| s.get_release(5)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_attempt_ceiling_drops_job_without_persisting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torrent/5"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let pool = test_pool(&server.uri());
        pool.run_detail_job(5).await;

        server.verify().await;
        assert_eq!(pool.store.with(|s| s.count_releases()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_listing_emits_no_candidates() {
        let server = MockServer::start().await;
        let pool = test_pool(&server.uri());

        pool.scan_listing("<html><body>maintenance</body></html>")
            .await
            .unwrap();

        // No detail fetches were issued
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_detail_is_skipped_not_persisted() {
        let server = MockServer::start().await;
        let body = DETAIL_BODY.replace("2024-01-02 03:04:05 UTC", "recently");
        Mock::given(method("GET"))
            .and(path("/torrent/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let pool = test_pool(&server.uri());
        pool.run_detail_job(5).await;

        assert_eq!(pool.store.with(|s| s.count_releases()).unwrap(), 0);
    }
}
