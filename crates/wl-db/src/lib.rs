//! Storage layer for the work log.
//!
//! Provides persistence for work-log entries using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. The CLI additionally holds
//! an exclusive file lock for every load/modify/save cycle.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Entry timestamps are naive local times stored as TEXT (`2024-01-15T10:30:00`).
//! Lexicographic ordering matches chronological ordering.
//!
//! ## Saving
//!
//! [`Database::save_worklog`] replaces the stored timeline as a whole inside one
//! transaction, mirroring the in-memory [`WorkLogData`] owned by the caller.

use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use wl_core::{WorkLogData, WorkLogEntry};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A row of the `entries` table before timestamp parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryRow {
    id: i64,
    start_time: String,
    end_time: String,
    work: bool,
    description: String,
}

impl EntryRow {
    fn into_entry(self) -> Result<WorkLogEntry, DbError> {
        Ok(WorkLogEntry {
            start_time: parse_timestamp(&self.start_time, self.id)?,
            end_time: parse_timestamp(&self.end_time, self.id)?,
            work: self.work,
            description: self.description,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Work-log entries; timestamps are naive local 'YYYY-MM-DDTHH:MM:SS'
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                work INTEGER NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_time);

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the whole timeline, sorted by start time.
    pub fn load_worklog(&self) -> Result<WorkLogData, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time, end_time, work, description
            FROM entries
            ORDER BY start_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                start_time: row.get(1)?,
                end_time: row.get(2)?,
                work: row.get(3)?,
                description: row.get(4)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(WorkLogData::from_entries(entries))
    }

    /// Replaces the stored timeline with `data`.
    pub fn save_worklog(&mut self, data: &WorkLogData) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO entries (start_time, end_time, work, description)
                VALUES (?, ?, ?, ?)
                ",
            )?;
            for entry in data {
                inserted += stmt.execute(params![
                    format_timestamp(entry.start_time),
                    format_timestamp(entry.end_time),
                    entry.work,
                    entry.description,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(entries = inserted, "saved work log");
        Ok(inserted)
    }

    pub fn entry_count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Reads a metadata value (e.g. `last_import`).
    pub fn get_meta(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO meta (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(timestamp: &str, entry_id: i64) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            entry_id,
            timestamp: timestamp.to_string(),
            source,
        }
    })
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
