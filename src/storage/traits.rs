//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Category, Release, Tag, Uploader};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored timestamp is not valid RFC 3339: {0}")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This is the read/insert/relate/count contract the indexer requires of its
/// record store. Reads are by natural key: external id for releases and
/// categories, unique name for uploaders and tags.
pub trait Storage {
    // ===== Releases =====

    /// Gets a release by its externally-assigned id
    fn get_release(&self, id: i64) -> StorageResult<Option<Release>>;

    /// Inserts a fully-populated release row
    ///
    /// The id is supplied by the caller, never generated. Fails if the id is
    /// already present.
    fn insert_release(&mut self, release: &Release) -> StorageResult<()>;

    /// Records a release↔tag association; duplicate pairs are ignored
    fn relate_tag(&mut self, release_id: i64, tag_id: i64) -> StorageResult<()>;

    /// Gets the tags associated with a release
    fn get_release_tags(&self, release_id: i64) -> StorageResult<Vec<Tag>>;

    // ===== Shared sub-entities =====

    /// Gets a category by its externally-assigned id
    fn get_category(&self, id: i64) -> StorageResult<Option<Category>>;

    /// Inserts a category with its externally-assigned id
    fn insert_category(&mut self, id: i64, name: &str) -> StorageResult<()>;

    /// Gets an uploader by name
    fn get_uploader_by_name(&self, name: &str) -> StorageResult<Option<Uploader>>;

    /// Inserts an uploader, returning its surrogate id
    fn insert_uploader(&mut self, name: &str) -> StorageResult<i64>;

    /// Gets a tag by name
    fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<Tag>>;

    /// Inserts a tag, returning its surrogate id
    fn insert_tag(&mut self, name: &str) -> StorageResult<i64>;

    // ===== Statistics =====

    /// Total number of indexed releases
    fn count_releases(&self) -> StorageResult<u64>;

    /// Total number of categories
    fn count_categories(&self) -> StorageResult<u64>;

    /// Total number of uploaders
    fn count_uploaders(&self) -> StorageResult<u64>;

    /// Total number of tags
    fn count_tags(&self) -> StorageResult<u64>;
}
