//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{Category, Release, Tag, Uploader};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn parse_stored_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}

impl Storage for SqliteStorage {
    // ===== Releases =====

    fn get_release(&self, id: i64) -> StorageResult<Option<Release>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, info_hash, size_bytes, file_count, info_url,
             lang_spoken, lang_texted, uploaded_at, category_id, uploader_id
             FROM releases WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, i64>(9)?,
                    row.get::<_, i64>(10)?,
                ))
            })
            .optional()?;

        match row {
            None => Ok(None),
            Some((
                id,
                title,
                info_hash,
                size_bytes,
                file_count,
                info_url,
                lang_spoken,
                lang_texted,
                uploaded_raw,
                category_id,
                uploader_id,
            )) => Ok(Some(Release {
                id,
                title,
                info_hash,
                size_bytes,
                file_count,
                info_url,
                lang_spoken,
                lang_texted,
                uploaded_at: parse_stored_timestamp(&uploaded_raw)?,
                category_id,
                uploader_id,
            })),
        }
    }

    fn insert_release(&mut self, release: &Release) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO releases (id, title, info_hash, size_bytes, file_count, info_url,
             lang_spoken, lang_texted, uploaded_at, category_id, uploader_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                release.id,
                release.title,
                release.info_hash,
                release.size_bytes,
                release.file_count,
                release.info_url,
                release.lang_spoken,
                release.lang_texted,
                release.uploaded_at.to_rfc3339(),
                release.category_id,
                release.uploader_id,
            ],
        )?;
        Ok(())
    }

    fn relate_tag(&mut self, release_id: i64, tag_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO release_tags (release_id, tag_id) VALUES (?1, ?2)",
            params![release_id, tag_id],
        )?;
        Ok(())
    }

    fn get_release_tags(&self, release_id: i64) -> StorageResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name FROM tags t
             JOIN release_tags rt ON rt.tag_id = t.id
             WHERE rt.release_id = ?1
             ORDER BY t.name",
        )?;

        let tags = stmt
            .query_map(params![release_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    // ===== Shared sub-entities =====

    fn get_category(&self, id: i64) -> StorageResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(category)
    }

    fn insert_category(&mut self, id: i64, name: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO categories (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    fn get_uploader_by_name(&self, name: &str) -> StorageResult<Option<Uploader>> {
        let uploader = self
            .conn
            .query_row(
                "SELECT id, name FROM uploaders WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Uploader {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(uploader)
    }

    fn insert_uploader(&mut self, name: &str) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO uploaders (name) VALUES (?1)",
            params![name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_tag_by_name(&self, name: &str) -> StorageResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT id, name FROM tags WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Tag {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(tag)
    }

    fn insert_tag(&mut self, name: &str) -> StorageResult<i64> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    // ===== Statistics =====

    fn count_releases(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(id) FROM releases", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_categories(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(id) FROM categories", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_uploaders(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(id) FROM uploaders", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_tags(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(id) FROM tags", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
