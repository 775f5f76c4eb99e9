//! Status command for showing the state of the work log.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};

use super::import::LAST_IMPORT_KEY;
use super::util::{format_duration, open_database};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, today: NaiveDate) -> Result<()> {
    let db = open_database(config)?;
    let data = db.load_worklog().context("failed to load work log")?;

    writeln!(writer, "Work log status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Sources:")?;
    for source in &config.sources {
        let state = if source.path.exists() { "" } else { " (missing)" };
        writeln!(
            writer,
            "- {} [{}]{state}",
            source.path.display(),
            source.format
        )?;
    }

    let last_import = db.get_meta(LAST_IMPORT_KEY)?;
    writeln!(
        writer,
        "Last import: {}",
        last_import.as_deref().unwrap_or("never")
    )?;

    let Some(recent) = data.recent_entry() else {
        writeln!(writer, "No entries recorded.")?;
        return Ok(());
    };

    writeln!(writer, "Entries: {}", data.len())?;
    writeln!(
        writer,
        "Most recent: {} - {} ({})",
        recent.start_time.format("%Y-%m-%d %H:%M"),
        recent.end_time.format("%Y-%m-%d %H:%M"),
        if recent.work { "work" } else { "break" }
    )?;

    let day_start = today.and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);
    let worked_today = data
        .entries_for_date(today)
        .into_iter()
        .filter(|e| e.work)
        .map(|e| e.end_time.min(day_end) - e.start_time.max(day_start))
        .fold(Duration::zero(), |acc, d| acc + d);
    writeln!(writer, "Worked today: {}", format_duration(worked_today))?;

    Ok(())
}
