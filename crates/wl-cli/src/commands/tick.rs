//! Tick command: keep the current entry growing while the machine is in use.
//!
//! Intended to run periodically (cron or a systemd timer).

use std::io::Write;

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use wl_core::WorkLogData;

pub fn run<W: Write>(
    writer: &mut W,
    data: &mut WorkLogData,
    now: NaiveDateTime,
    max_gap: Duration,
) -> Result<bool> {
    let extended = data.extend_recent(now, max_gap);
    match data.recent_entry() {
        Some(entry) if extended => {
            tracing::debug!(end = %entry.end_time, "extended recent entry");
            writeln!(
                writer,
                "Extended recent entry to {}",
                entry.end_time.format("%Y-%m-%d %H:%M")
            )?;
        }
        Some(entry) => {
            writeln!(
                writer,
                "Recent entry ended {}, not extended",
                entry.end_time.format("%Y-%m-%d %H:%M")
            )?;
        }
        None => writeln!(writer, "No entries.")?,
    }
    Ok(extended)
}
