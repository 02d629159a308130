//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait. It
//! persists URL records across runs, which is what makes crawl recovery
//! possible.

use crate::state::{UrlRecord, UrlStatus};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use url::Url;

const VISITS_COUNTER: &str = "visits";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens or creates a store at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Deletes every record and counter, for a fresh crawl
    pub fn clear(&self) -> StorageResult<()> {
        self.conn()?
            .execute_batch("DELETE FROM urls; DELETE FROM counters;")?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Lock("sqlite connection".to_string()))
    }
}

/// Raw column values of a `urls` row, converted outside the rusqlite closure
struct RawRecord {
    url: String,
    visit_count: u32,
    last_visit: Option<String>,
    error_count: u32,
    status: String,
    score: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            visit_count: row.get(1)?,
            last_visit: row.get(2)?,
            error_count: row.get(3)?,
            status: row.get(4)?,
            score: row.get(5)?,
        })
    }

    fn into_record(self) -> StorageResult<UrlRecord> {
        let corrupt = |reason: String| StorageError::Corrupt {
            url: self.url.clone(),
            reason,
        };

        let url = Url::parse(&self.url).map_err(|e| corrupt(e.to_string()))?;
        let status = UrlStatus::from_db_string(&self.status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", self.status)))?;
        let last = self
            .last_visit
            .as_deref()
            .map(|s| {
                DateTime::parse_from_rfc3339(s)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| corrupt(e.to_string()))
            })
            .transpose()?;

        Ok(UrlRecord {
            url,
            visit_count: self.visit_count,
            last,
            error_count: self.error_count,
            status,
            score: self.score,
        })
    }
}

impl Store for SqliteStore {
    fn get(&self, url: &Url) -> StorageResult<UrlRecord> {
        let conn = self.conn()?;
        let existing = conn
            .query_row(
                "SELECT url, visit_count, last_visit, error_count, status, score
                 FROM urls WHERE url = ?1",
                params![url.as_str()],
                RawRecord::from_row,
            )
            .optional()?;

        if let Some(raw) = existing {
            return raw.into_record();
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO urls (url, status, discovered_at) VALUES (?1, ?2, ?3)",
            params![url.as_str(), UrlStatus::Pending.to_db_string(), now],
        )?;
        Ok(UrlRecord::new(url.clone()))
    }

    fn update(&self, record: &UrlRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO urls (url, visit_count, last_visit, error_count, status, score, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(url) DO UPDATE SET
                visit_count = excluded.visit_count,
                last_visit = excluded.last_visit,
                error_count = excluded.error_count,
                status = excluded.status,
                score = excluded.score",
            params![
                record.url.as_str(),
                record.visit_count,
                record.last.map(|t| t.to_rfc3339()),
                record.error_count,
                record.status.to_db_string(),
                record.score,
                now
            ],
        )?;
        Ok(())
    }

    fn update_status(&self, url: &Url, status: UrlStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO urls (url, status, discovered_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET status = excluded.status",
            params![url.as_str(), status.to_db_string(), now],
        )?;
        Ok(())
    }

    fn inc_visit_count(&self) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO counters (name, value) VALUES (?1, 1)
             ON CONFLICT(name) DO UPDATE SET value = value + 1",
            params![VISITS_COUNTER],
        )?;
        Ok(())
    }

    fn visit_count(&self) -> StorageResult<u64> {
        let value: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT value FROM counters WHERE name = ?1",
                params![VISITS_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or(0).max(0) as u64)
    }

    fn is_finished(&self) -> StorageResult<bool> {
        let any_pending: bool = self.conn()?.query_row(
            "SELECT EXISTS(SELECT 1 FROM urls WHERE status = ?1)",
            params![UrlStatus::Pending.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(!any_pending)
    }

    fn pending(&self) -> StorageResult<Vec<Url>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT url FROM urls WHERE status = ?1 ORDER BY url")?;
        let rows = stmt
            .query_map(params![UrlStatus::Pending.to_db_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|s| {
                Url::parse(&s).map_err(|e| StorageError::Corrupt {
                    url: s.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn count_by_status(&self, status: UrlStatus) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM urls WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
