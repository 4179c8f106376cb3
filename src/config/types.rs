use serde::Deserialize;

/// Main configuration structure for driftnet
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub poll: PollConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Target site layout
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the listing site, e.g. "http://uj3wazyk5u4hnvtk.onion"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the recent-releases listing page
    #[serde(rename = "listing-path", default = "default_listing_path")]
    pub listing_path: String,

    /// Path prefix of detail pages; the release id is appended as a segment
    #[serde(rename = "detail-path", default = "default_detail_path")]
    pub detail_path: String,
}

/// Poll loop behavior
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between listing polls
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,

    /// Hours after which an indexed release counts as stale evidence that
    /// everything older was already scanned
    #[serde(rename = "freshness-window-hours")]
    pub freshness_window_hours: u64,
}

/// Fetch scheduler and transport behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Maximum number of concurrently in-flight fetch jobs
    #[serde(rename = "max-in-flight")]
    pub max_in_flight: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum fetch attempts per target before the job is dropped
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential retry backoff (milliseconds)
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,

    /// Cap on the retry backoff delay (milliseconds)
    #[serde(rename = "retry-max-delay-ms")]
    pub retry_max_delay_ms: u64,

    /// Optional proxy for all requests, e.g. "socks5://127.0.0.1:9050"
    #[serde(rename = "proxy-url", default)]
    pub proxy_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_listing_path() -> String {
    "/recent".to_string()
}

fn default_detail_path() -> String {
    "/torrent".to_string()
}

impl Config {
    /// Full URL of the listing page
    pub fn listing_url(&self) -> String {
        format!(
            "{}/{}",
            self.site.base_url.trim_end_matches('/'),
            self.site.listing_path.trim_matches('/')
        )
    }

    /// Full URL of the detail page for one release id
    pub fn detail_url(&self, id: i64) -> String {
        format!(
            "{}/{}/{}",
            self.site.base_url.trim_end_matches('/'),
            self.site.detail_path.trim_matches('/'),
            id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_base(base: &str) -> Config {
        Config {
            site: SiteConfig {
                base_url: base.to_string(),
                listing_path: default_listing_path(),
                detail_path: default_detail_path(),
            },
            poll: PollConfig {
                interval_secs: 60,
                freshness_window_hours: 24,
            },
            fetch: FetchConfig {
                max_in_flight: 20,
                request_timeout_secs: 30,
                connect_timeout_secs: 10,
                max_attempts: 5,
                retry_base_delay_ms: 500,
                retry_max_delay_ms: 30_000,
                proxy_url: None,
            },
            output: OutputConfig {
                database_path: "./index.db".to_string(),
            },
        }
    }

    #[test]
    fn test_listing_url_joins_cleanly() {
        let config = config_with_base("http://example.onion/");
        assert_eq!(config.listing_url(), "http://example.onion/recent");
    }

    #[test]
    fn test_detail_url_appends_id() {
        let config = config_with_base("http://example.onion");
        assert_eq!(config.detail_url(7842871), "http://example.onion/torrent/7842871");
    }
}
