//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::adapter::Portal;
use crate::model::ScrapeData;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::Snapshot;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// Missing parent directories are created.
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
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn save_snapshot(&mut self, portal: Portal, data: &ScrapeData) -> StorageResult<i64> {
        let payload = serde_json::to_string(data)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO snapshots (portal, captured_at, payload) VALUES (?1, ?2, ?3)",
            params![portal.as_str(), now, payload],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!(portal = %portal, snapshot_id = id, "Saved snapshot");
        Ok(id)
    }

    fn latest_snapshot(&self, portal: Portal) -> StorageResult<Option<Snapshot>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, portal, captured_at, payload FROM snapshots
             WHERE portal = ?1 ORDER BY id DESC LIMIT 1",
        )?;

        let row = stmt
            .query_row(params![portal.as_str()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, portal, captured_at, payload)) => Ok(Some(Snapshot {
                id,
                portal,
                captured_at,
                data: serde_json::from_str(&payload)?,
            })),
            None => Ok(None),
        }
    }

    fn snapshot_count(&self, portal: Portal) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE portal = ?1",
            params![portal.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
