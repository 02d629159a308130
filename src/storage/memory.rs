//! In-memory storage implementation
//!
//! Used for one-shot crawls that do not need to survive a restart, and by the
//! scheduler tests.

use crate::state::{UrlRecord, UrlStatus};
use crate::storage::traits::{Store, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, UrlRecord>,
    pending: usize,
    visits: u64,
}

impl Inner {
    /// Stores a record and keeps the pending counter in step with it
    fn put(&mut self, record: UrlRecord) {
        let was_pending = self
            .records
            .get(record.url.as_str())
            .map(|old| old.status == UrlStatus::Pending);
        let is_pending = record.status == UrlStatus::Pending;

        match (was_pending, is_pending) {
            (None | Some(false), true) => self.pending += 1,
            (Some(true), false) => self.pending -= 1,
            _ => {}
        }

        self.records.insert(record.url.as_str().to_string(), record);
    }
}

/// Store backed by a `HashMap` behind a mutex
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Lock("memory store".to_string()))
    }
}

impl Store for MemoryStore {
    fn get(&self, url: &Url) -> StorageResult<UrlRecord> {
        let mut inner = self.lock()?;
        if let Some(record) = inner.records.get(url.as_str()) {
            return Ok(record.clone());
        }

        let record = UrlRecord::new(url.clone());
        inner.put(record.clone());
        Ok(record)
    }

    fn update(&self, record: &UrlRecord) -> StorageResult<()> {
        self.lock()?.put(record.clone());
        Ok(())
    }

    fn update_status(&self, url: &Url, status: UrlStatus) -> StorageResult<()> {
        let mut inner = self.lock()?;
        let mut record = inner
            .records
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| UrlRecord::new(url.clone()));
        record.status = status;
        inner.put(record);
        Ok(())
    }

    fn inc_visit_count(&self) -> StorageResult<()> {
        self.lock()?.visits += 1;
        Ok(())
    }

    fn visit_count(&self) -> StorageResult<u64> {
        Ok(self.lock()?.visits)
    }

    fn is_finished(&self) -> StorageResult<bool> {
        Ok(self.lock()?.pending == 0)
    }

    fn pending(&self) -> StorageResult<Vec<Url>> {
        let inner = self.lock()?;
        let mut urls: Vec<Url> = inner
            .records
            .values()
            .filter(|r| r.status == UrlStatus::Pending)
            .map(|r| r.url.clone())
            .collect();
        urls.sort();
        Ok(urls)
    }

    fn count_by_status(&self, status: UrlStatus) -> StorageResult<u64> {
        let inner = self.lock()?;
        Ok(inner.records.values().filter(|r| r.status == status).count() as u64)
    }
}
