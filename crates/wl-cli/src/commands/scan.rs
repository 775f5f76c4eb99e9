//! Scan command: print the activity intervals found in log files.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use wl_core::{Interval, LogFormat, fix_years, parse_file_with_stats};

use super::util::format_duration;

/// Parses `files` in the given order and returns their combined intervals.
///
/// Unlike `import`, a file that cannot be read is an error.
pub fn collect_intervals(files: &[PathBuf], format: LogFormat) -> Result<Vec<Interval>> {
    let mut intervals = Vec::new();
    for path in files {
        let (found, stats) = parse_file_with_stats(path, format)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if stats.lines_skipped > 0 {
            tracing::info!(
                path = %path.display(),
                skipped = stats.lines_skipped,
                "some log lines could not be parsed"
            );
        }
        intervals.extend(found);
    }
    fix_years(&mut intervals);
    Ok(intervals)
}

pub fn format_intervals(intervals: &[Interval]) -> String {
    if intervals.is_empty() {
        return "No activity found.\n".to_string();
    }
    let mut output = String::new();
    for interval in intervals {
        output.push_str(&format!(
            "{interval}  ({})\n",
            format_duration(interval.duration())
        ));
    }
    output
}

pub fn format_intervals_json(intervals: &[Interval]) -> Result<String> {
    Ok(serde_json::to_string_pretty(intervals)?)
}

pub fn run<W: Write>(
    writer: &mut W,
    files: &[PathBuf],
    format: LogFormat,
    json: bool,
) -> Result<()> {
    let intervals = collect_intervals(files, format)?;
    if json {
        writeln!(writer, "{}", format_intervals_json(&intervals)?)?;
    } else {
        write!(writer, "{}", format_intervals(&intervals))?;
    }
    Ok(())
}
