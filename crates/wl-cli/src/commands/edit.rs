//! Manual timeline edits: add, remove, join and merge.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use wl_core::{WorkLogData, WorkLogEntry};

use crate::Direction;

fn describe(entry: &WorkLogEntry) -> String {
    format!(
        "{} - {}",
        entry.start_time.format("%Y-%m-%d %H:%M"),
        entry.end_time.format("%Y-%m-%d %H:%M")
    )
}

/// Adds an entry and reports the index it landed at.
pub fn add<W: Write>(
    writer: &mut W,
    data: &mut WorkLogData,
    start: NaiveDateTime,
    end: NaiveDateTime,
    work: bool,
    description: &str,
) -> Result<usize> {
    let entry = WorkLogEntry::new(start, end, work, description)?;
    let label = describe(&entry);
    let index = data.add_entry(entry);
    writeln!(writer, "Added [{index}] {label}")?;
    Ok(index)
}

pub fn remove<W: Write>(writer: &mut W, data: &mut WorkLogData, index: usize) -> Result<()> {
    let removed = data.remove_entry(index)?;
    writeln!(writer, "Removed [{index}] {}", describe(&removed))?;
    Ok(())
}

/// Moves the boundary of entry `index` onto its neighbour, closing the gap.
///
/// Reports the joined entry at the index it holds after the edit.
pub fn join<W: Write>(
    writer: &mut W,
    data: &mut WorkLogData,
    index: usize,
    direction: Direction,
) -> Result<()> {
    let joined = match direction {
        Direction::Up => data.join_up(index),
        Direction::Down => data.join_down(index),
    }
    .with_context(|| format!("cannot join entry {index}"))?;

    if let Some(entry) = data.get(joined) {
        writeln!(writer, "Joined [{joined}] {}", describe(entry))?;
    }
    Ok(())
}

/// Absorbs entry `index` into its neighbour.
pub fn merge<W: Write>(
    writer: &mut W,
    data: &mut WorkLogData,
    index: usize,
    direction: Direction,
) -> Result<()> {
    match direction {
        Direction::Up => data.merge_up(index),
        Direction::Down => data.merge_down(index),
    }
    .with_context(|| format!("cannot merge entry {index}"))?;

    let target = match direction {
        Direction::Up => index - 1,
        Direction::Down => index,
    };
    if let Some(entry) = data.get(target) {
        writeln!(writer, "Merged into [{target}] {}", describe(entry))?;
    }
    Ok(())
}
