//! Storage module for the release record store
//!
//! This module handles all database operations for the indexer, including:
//! - SQLite database initialization and schema management
//! - Release persistence and tag relations
//! - Shared sub-entity rows (category, uploader, tag)
//! - The process-wide store handle and write section

mod resolver;
mod schema;
mod sqlite;
mod traits;

pub use resolver::Resolver;
pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// A fully-populated release row
///
/// The id is assigned by the listing site and never reused; everything else
/// comes from the release's detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub id: i64,
    pub title: String,
    pub info_hash: String,
    pub size_bytes: i64,
    pub file_count: i64,
    pub info_url: String,
    pub lang_spoken: String,
    pub lang_texted: String,
    pub uploaded_at: DateTime<Utc>,
    pub category_id: i64,
    pub uploader_id: i64,
}

/// A category row; the id comes from the site's taxonomy, not from us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// An uploader row, unique by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uploader {
    pub id: i64,
    pub name: String,
}

/// A tag row, unique by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Shared access to the record store
///
/// Statement-level access is serialized by the inner storage mutex. On top of
/// that, a separate write section serializes every check-then-act sequence
/// (the resolver's insert paths and the final release-plus-relations insert).
/// Plain reads take only the storage mutex and never wait on the write
/// section, which is safe because writers re-check under the section instead
/// of relying on read freshness.
pub struct StoreHandle {
    storage: Mutex<SqliteStorage>,
    write_section: Mutex<()>,
}

impl StoreHandle {
    /// Wraps an opened storage backend
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage: Mutex::new(storage),
            write_section: Mutex::new(()),
        }
    }

    /// Runs one storage operation while holding the storage mutex
    pub fn with<R>(&self, f: impl FnOnce(&mut SqliteStorage) -> R) -> R {
        let mut storage = self.storage.lock().unwrap();
        f(&mut storage)
    }

    /// Enters the process-wide write section
    ///
    /// Hold the returned guard across a whole check-then-act sequence. Do not
    /// call the resolver while holding it; the resolver takes the section
    /// itself.
    pub fn write_section(&self) -> MutexGuard<'_, ()> {
        self.write_section.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_handle_runs_operations() {
        let handle = StoreHandle::new(SqliteStorage::new_in_memory().unwrap());

        let count = handle.with(|s| s.count_releases()).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_write_section_is_reacquirable() {
        let handle = StoreHandle::new(SqliteStorage::new_in_memory().unwrap());

        drop(handle.write_section());
        drop(handle.write_section());
    }
}
