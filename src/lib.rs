//! Driftnet: an incremental release indexer
//!
//! This crate polls a sequentially-numbered release listing, walks the id
//! frontier downward to find unindexed releases, fetches their detail pages
//! under a bounded in-flight limit, and normalizes each page into a
//! relational SQLite store.

pub mod config;
pub mod indexer;
pub mod storage;

use thiserror::Error;

/// Main error type for driftnet operations
#[derive(Debug, Error)]
pub enum DriftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while pulling structured fields out of a fetched document.
///
/// Listing errors drop the current poll tick; detail errors drop the single
/// release they concern. Neither is fatal to the process.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Listing page has no parsable newest release id")]
    ListingUnparsable,

    #[error("Release {0} has no info hash in either details column")]
    EmptyInfoHash(i64),

    #[error("Unparsable size value: {0:?}")]
    MalformedSize(String),

    #[error("Unparsable upload timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error("Unparsable category link: {0:?}")]
    MalformedCategory(String),

    #[error("Unparsable file count: {0:?}")]
    MalformedFileCount(String),

    #[error("Unrecognized detail field {field:?} with value {value:?}")]
    UnknownField { field: String, value: String },

    #[error("Release {id} is missing the mandatory {field} field")]
    MissingField { id: i64, field: &'static str },
}

/// Result type alias for driftnet operations
pub type Result<T> = std::result::Result<T, DriftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use storage::{Release, SqliteStorage, Storage, StoreHandle};
