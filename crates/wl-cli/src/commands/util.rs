//! Shared utilities for CLI commands.

use std::fs::File;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use fs2::FileExt;
use regex::Regex;
use wl_core::WorkLogData;
use wl_db::Database;

use crate::Config;

/// Pre-compiled regex for local datetimes ("2025-01-15 10:30" or "2025-01-15T10:30").
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2})(?::(\d{2}))?$").unwrap()
});

/// Parse a local datetime at minute resolution.
///
/// Supports:
/// - "2025-01-15 10:30"
/// - "2025-01-15T10:30" (optionally with `:SS`, which is dropped)
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let Some(caps) = DATETIME_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid datetime: {s}. Use YYYY-MM-DD HH:MM (e.g., '2025-01-15 10:30')");
    };

    let field = |idx: usize| -> Result<u32> {
        caps[idx]
            .parse()
            .with_context(|| format!("failed to parse number in datetime {s}"))
    };
    let year = i32::try_from(field(1)?).context("year out of range")?;

    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)
        .and_then(|date| date.and_hms_opt(field(4).ok()?, field(5).ok()?, 0))
        .with_context(|| format!("Invalid datetime: {s}. No such date or time"))
}

/// Parse a calendar day ("2025-01-15").
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {s}. Use YYYY-MM-DD"))
}

/// Formats a duration as "Xh Ym" (or "Ym" under an hour).
pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes();
    if total_minutes < 0 {
        return "0m".to_string();
    }
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Exclusive lock held across a load/modify/save cycle.
///
/// Released when dropped.
pub struct WorkLogLock {
    _file: File,
}

impl WorkLogLock {
    pub fn acquire(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        let file = File::create(config.lock_path()).context("failed to create lock file")?;
        file.lock_exclusive().context("failed to acquire lock")?;
        Ok(Self { _file: file })
    }
}

/// Opens the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Loads the work log, applies `change` and saves the result, all under the lock.
///
/// Nothing is written when `change` fails.
pub fn with_worklog<T, F>(config: &Config, change: F) -> Result<T>
where
    F: FnOnce(&mut WorkLogData) -> Result<T>,
{
    let _lock = WorkLogLock::acquire(config)?;
    let mut db = open_database(config)?;
    let mut data = db.load_worklog().context("failed to load work log")?;
    let value = change(&mut data)?;
    db.save_worklog(&data).context("failed to save work log")?;
    Ok(value)
}
