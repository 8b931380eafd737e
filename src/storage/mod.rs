//! Storage module for persisting scrape results
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - Saving scrape payloads per portal with a capture timestamp
//! - Reading back the latest payload

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::model::ScrapeData;
use serde::Serialize;
use std::path::Path;

/// Opens (or creates) the snapshot database at `path`
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A persisted scrape payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: i64,
    pub portal: String,

    /// RFC 3339 capture time
    pub captured_at: String,

    pub data: ScrapeData,
}
