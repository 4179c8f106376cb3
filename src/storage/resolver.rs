//! Get-or-create resolution for shared sub-entities
//!
//! Categories, uploaders, and tags are shared across releases and written by
//! many concurrent detail jobs. The resolver guarantees at most one row per
//! natural key: an optimistic unlocked read, and only on a miss the
//! process-wide write section, a re-read, and the insert. Readers never wait
//! on the section; only the insert path does.

use crate::storage::{Storage, StorageResult, StoreHandle};

/// Race-safe get-or-create over the shared store
pub struct Resolver<'a> {
    store: &'a StoreHandle,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a StoreHandle) -> Self {
        Self { store }
    }

    /// Resolves a category by its externally-assigned id
    ///
    /// The id is the dedup key; the displayed name is supplementary and only
    /// stored when the row is first created.
    pub fn category(&self, id: i64, name: &str) -> StorageResult<i64> {
        if let Some(existing) = self.store.with(|s| s.get_category(id))? {
            return Ok(existing.id);
        }

        let _section = self.store.write_section();
        if let Some(existing) = self.store.with(|s| s.get_category(id))? {
            return Ok(existing.id);
        }

        tracing::debug!("Adding category {}: {}", id, name);
        self.store.with(|s| s.insert_category(id, name))?;
        Ok(id)
    }

    /// Resolves an uploader by name
    pub fn uploader(&self, name: &str) -> StorageResult<i64> {
        if let Some(existing) = self.store.with(|s| s.get_uploader_by_name(name))? {
            return Ok(existing.id);
        }

        let _section = self.store.write_section();
        if let Some(existing) = self.store.with(|s| s.get_uploader_by_name(name))? {
            return Ok(existing.id);
        }

        tracing::debug!("Adding uploader: {}", name);
        self.store.with(|s| s.insert_uploader(name))
    }

    /// Resolves a tag by name
    pub fn tag(&self, name: &str) -> StorageResult<i64> {
        if let Some(existing) = self.store.with(|s| s.get_tag_by_name(name))? {
            return Ok(existing.id);
        }

        let _section = self.store.write_section();
        if let Some(existing) = self.store.with(|s| s.get_tag_by_name(name))? {
            return Ok(existing.id);
        }

        tracing::debug!("Adding tag: {}", name);
        self.store.with(|s| s.insert_tag(name))
    }
}
