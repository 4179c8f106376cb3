//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the driftnet database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Categories carry the site's own taxonomy ids, not locally generated ones
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

-- Uploaders are deduplicated by name
CREATE TABLE IF NOT EXISTS uploaders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Tags are deduplicated by name
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- One row per fully-indexed release; ids come from the site and are never reused
CREATE TABLE IF NOT EXISTS releases (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    info_hash TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    file_count INTEGER NOT NULL,
    info_url TEXT NOT NULL,
    lang_spoken TEXT NOT NULL,
    lang_texted TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    uploader_id INTEGER NOT NULL REFERENCES uploaders(id)
);

CREATE INDEX IF NOT EXISTS idx_releases_uploaded ON releases(uploaded_at);
CREATE INDEX IF NOT EXISTS idx_releases_category ON releases(category_id);

-- Release↔tag relation; the UNIQUE pair keeps the set free of duplicates
CREATE TABLE IF NOT EXISTS release_tags (
    release_id INTEGER NOT NULL REFERENCES releases(id),
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    UNIQUE(release_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_release_tags_release ON release_tags(release_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["categories", "uploaders", "tags", "releases", "release_tags"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
