//! Storage module for URL records
//!
//! This module handles persistence of per-URL visit metadata:
//! - The `Store` trait the scheduler is written against
//! - An in-memory store for one-shot crawls and tests
//! - A SQLite store that survives restarts and enables recovery

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use crate::config::StoreConfig;
use std::path::Path;
use std::sync::Arc;

/// Opens the store described by the configuration
///
/// With a database path the SQLite store is used; without one, records live
/// in memory for the duration of the process. `fresh` discards any records a
/// previous run left behind.
pub fn open_store(config: &StoreConfig, fresh: bool) -> StorageResult<Arc<dyn Store>> {
    match &config.database_path {
        Some(path) => {
            let store = SqliteStore::new(Path::new(path))?;
            if fresh {
                tracing::info!("Clearing previous crawl state from {}", path);
                store.clear()?;
            }
            Ok(Arc::new(store))
        }
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
