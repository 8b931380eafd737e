//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::adapter::Portal;
use crate::model::ScrapeData;
use crate::storage::Snapshot;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of scrape payloads keyed by portal and capture time
///
/// Reads return the most recently written snapshot (last write wins).
pub trait Storage {
    /// Persists `data` for `portal`
    ///
    /// # Returns
    ///
    /// The ID of the new snapshot
    fn save_snapshot(&mut self, portal: Portal, data: &ScrapeData) -> StorageResult<i64>;

    /// Gets the most recent snapshot for `portal`, if any
    fn latest_snapshot(&self, portal: Portal) -> StorageResult<Option<Snapshot>>;

    /// Counts the snapshots stored for `portal`
    fn snapshot_count(&self, portal: Portal) -> StorageResult<u64>;
}
