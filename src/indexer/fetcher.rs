//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the indexer, including:
//! - Building the HTTP client with timeouts and the optional proxy
//! - Fetching listing and detail pages
//! - Classifying responses into the scheduler's outcome taxonomy

use crate::config::FetchConfig;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Result of a single fetch attempt
///
/// Every response or error collapses into one of three outcomes: the
/// document body, a permanent not-found, or a transient failure the
/// scheduler may retry.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Page body content
        body: String,
    },

    /// The target does not exist (HTTP 404); never retried
    NotFound,

    /// Any other failure: non-success status, network error, timeout
    Transient {
        /// Error description
        error: String,
    },
}

/// Builds the HTTP client used for all fetches
///
/// All requests share one client so they ride the same proxy and connection
/// pool. The proxy, when configured, is typically a SOCKS relay
/// (e.g. `socks5://127.0.0.1:9050`).
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let user_agent = concat!("driftnet/", env!("CARGO_PKG_VERSION"));

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }

    builder.build()
}

/// Fetches one page and classifies the result
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_page(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                return FetchOutcome::NotFound;
            }

            if !status.is_success() {
                return FetchOutcome::Transient {
                    error: format!("HTTP {}", status.as_u16()),
                };
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success { body },
                Err(e) => FetchOutcome::Transient {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchOutcome::Transient { error }
        }
    }
}
