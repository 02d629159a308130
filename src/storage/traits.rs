//! Storage traits and error types
//!
//! This module defines the trait interface for URL store backends and the
//! associated error types.

use crate::state::{UrlRecord, UrlStatus};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned: {0}")]
    Lock(String),

    #[error("Corrupt record for {url}: {reason}")]
    Corrupt { url: String, reason: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for URL store implementations
///
/// The store is keyed by canonical URL and holds one [`UrlRecord`] per URL.
/// Implementations must be safe to share between tasks. In this crate the
/// scheduler is the only writer of statuses and counters; other callers only
/// read.
pub trait Store: Send + Sync {
    /// Gets the record for a URL, creating a fresh pending record if absent
    fn get(&self, url: &Url) -> StorageResult<UrlRecord>;

    /// Writes a full record back to the store
    fn update(&self, record: &UrlRecord) -> StorageResult<()>;

    /// Sets the status of a URL's record, creating the record if absent
    fn update_status(&self, url: &Url, status: UrlStatus) -> StorageResult<()>;

    /// Increments the global visited-page counter
    fn inc_visit_count(&self) -> StorageResult<()>;

    /// Returns the global visited-page counter
    fn visit_count(&self) -> StorageResult<u64>;

    /// Returns true if no pending records remain
    ///
    /// A URL stays pending while it is waiting, due, or being fetched, so this
    /// also means no work is in flight.
    fn is_finished(&self) -> StorageResult<bool>;

    /// Lists every pending URL, used to recover an interrupted crawl
    fn pending(&self) -> StorageResult<Vec<Url>>;

    /// Counts records with the given status
    fn count_by_status(&self, status: UrlStatus) -> StorageResult<u64>;
}
