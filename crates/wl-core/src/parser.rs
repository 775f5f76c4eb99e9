//! Reconstruction of machine activity intervals from kernel/system logs.
//!
//! # Algorithm Summary
//!
//! 1. Stream the log line by line; malformed lines are logged and skipped.
//! 2. Every accepted line becomes a [`BootTimestamp`] with the year seeded
//!    from the file's modification time.
//! 3. A kernel monotonic counter that goes backwards marks a reboot and
//!    closes the accumulated run.
//! 4. `PM: suspend entry` closes the run and discards lines until
//!    `PM: suspend exit`.
//! 5. Each closed run is split into intervals at monotonic breaks
//!    ([`split_boot_sessions`]), then years are corrected backwards from the
//!    end of the file ([`fix_years`]).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime};
use flate2::read::MultiGzDecoder;
use thiserror::Error;

use crate::logline::{LogFormat, LogLine};
use crate::timestamp::previous_year;
use crate::types::Interval;

/// Buffer size for `BufReader` (64KB, log files can be large).
const BUFFER_SIZE: usize = 64 * 1024;

/// Lines without their own monotonic stamp logged this close before a reboot
/// belong to the new boot.
const REBOOT_CARRY_MARGIN_SECS: i64 = 120;

const SUSPEND_ENTRY: &str = "PM: suspend entry";
const SUSPEND_EXIT: &str = "PM: suspend exit";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot access {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wall clock (year seeded, minute resolution) paired with the kernel's
/// seconds-since-boot counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootTimestamp {
    pub wall: NaiveDateTime,
    /// `None` for lines that did not come from the kernel.
    pub mono: Option<f64>,
}

/// Counters collected during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines_read: usize,
    pub lines_skipped: usize,
    pub reboots: usize,
    pub suspends: usize,
}

/// Single-pass scanner state.
#[derive(Debug)]
pub struct LogIntervalParser {
    format: LogFormat,
    seed_year: i32,
    recent_kern: Option<f64>,
    suspended: bool,
    pending: Vec<BootTimestamp>,
    intervals: Vec<Interval>,
    stats: ParseStats,
}

impl LogIntervalParser {
    pub const fn new(format: LogFormat, seed_year: i32) -> Self {
        Self {
            format,
            seed_year,
            recent_kern: None,
            suspended: false,
            pending: Vec::new(),
            intervals: Vec::new(),
            stats: ParseStats {
                lines_read: 0,
                lines_skipped: 0,
                reboots: 0,
                suspends: 0,
            },
        }
    }

    /// Consumes one raw line. `line_no` is only used for diagnostics.
    pub fn feed_line(&mut self, line: &str, line_no: usize) {
        self.stats.lines_read += 1;

        let line = line.trim_start_matches('\0');
        let parsed = match LogLine::parse(line, self.format) {
            Ok(parsed) => parsed,
            Err(error) => {
                self.stats.lines_skipped += 1;
                tracing::warn!(line = line_no, %error, "skipping log line");
                return;
            }
        };

        let stamp = BootTimestamp {
            wall: parsed.wall.with_year(self.seed_year),
            mono: parsed.mono,
        };

        if let Some(mono) = parsed.mono {
            let rebooted = self.recent_kern.is_some_and(|recent| mono < recent);
            self.recent_kern = Some(mono);
            if rebooted {
                self.stats.reboots += 1;
                tracing::debug!(line = line_no, wall = %stamp.wall, "reboot detected");
                // a crash while asleep leaves no resume line
                self.suspended = false;
                self.close_boot(stamp.wall);
            }
        }

        if self.suspended {
            if parsed.message.contains(SUSPEND_EXIT) {
                tracing::debug!(line = line_no, wall = %stamp.wall, "resumed");
                self.suspended = false;
                self.pending.push(stamp);
            }
            return;
        }

        self.pending.push(stamp);

        if parsed.message.contains(SUSPEND_ENTRY) {
            tracing::debug!(line = line_no, wall = %stamp.wall, "suspended");
            self.stats.suspends += 1;
            self.flush();
            self.suspended = true;
        }
    }

    /// Flushes what is left and returns year-corrected intervals.
    pub fn finish(mut self) -> (Vec<Interval>, ParseStats) {
        self.flush();

        let mut intervals = self.intervals;
        fix_years(&mut intervals);
        for interval in &mut intervals {
            if interval.end < interval.start {
                tracing::debug!(%interval.start, %interval.end, "clock went backwards, clamping");
                interval.end = interval.start;
            }
        }
        (intervals, self.stats)
    }

    /// Closes the run that ended with a reboot at `reboot_wall`.
    fn close_boot(&mut self, reboot_wall: NaiveDateTime) {
        let mut split = self.pending.len();
        while split > 0 {
            let entry = &self.pending[split - 1];
            if entry.mono.is_some() || !within_carry_margin(entry.wall, reboot_wall) {
                break;
            }
            split -= 1;
        }
        let carried = self.pending.split_off(split);
        self.flush();
        self.pending = carried;
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.intervals.extend(split_boot_sessions(&self.pending));
        self.pending.clear();
    }
}

/// True when `earlier` lies at most two minutes before `later`.
///
/// Tolerates a Dec/Jan wrap of the seeded year.
fn within_carry_margin(earlier: NaiveDateTime, later: NaiveDateTime) -> bool {
    let earlier = if earlier > later {
        previous_year(earlier)
    } else {
        earlier
    };
    let gap = later - earlier;
    gap >= Duration::zero() && gap <= Duration::seconds(REBOOT_CARRY_MARGIN_SECS)
}

/// Splits one run of timestamps wherever the monotonic counter decreases.
///
/// Entries without a monotonic value never break a run. The returned
/// intervals are in input order and are not year-corrected yet.
pub fn split_boot_sessions(entries: &[BootTimestamp]) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let Some(first) = entries.first() else {
        return intervals;
    };

    let mut start = first.wall;
    let mut last = first.wall;
    let mut retained = first.mono;

    for entry in &entries[1..] {
        let decreased = matches!((retained, entry.mono), (Some(prev), Some(curr)) if curr < prev);
        if decreased {
            intervals.push(Interval { start, end: last });
            start = entry.wall;
        }
        last = entry.wall;
        if entry.mono.is_some() {
            retained = entry.mono;
        }
    }

    intervals.push(Interval { start, end: last });
    intervals
}

/// Corrects seeded years by walking backwards from the newest value.
///
/// The newest value keeps its year; any earlier value whose calendar date is
/// later than the value after it has wrapped over New Year and is moved back
/// one year. The result is non-decreasing by date. Running it twice changes
/// nothing.
pub fn fix_years(intervals: &mut [Interval]) {
    let mut next: Option<NaiveDateTime> = None;
    for interval in intervals.iter_mut().rev() {
        for value in [&mut interval.end, &mut interval.start] {
            if let Some(next) = next {
                while value.date() > next.date() {
                    *value = previous_year(*value);
                }
            }
            next = Some(*value);
        }
    }
}

/// Year of the file's last modification, in local time.
pub fn seed_year(path: &Path) -> Result<i32, ParseError> {
    let access = |source| ParseError::Access {
        path: path.to_path_buf(),
        source,
    };
    let modified = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(access)?;
    Ok(DateTime::<Local>::from(modified).year())
}

/// Opens a log, transparently decompressing `.gz` rotations.
fn open_log(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Access {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Parses a log stream whose newest line belongs to `seed_year`.
pub fn parse_reader_with_stats<R: BufRead>(
    mut reader: R,
    format: LogFormat,
    seed_year: i32,
) -> Result<(Vec<Interval>, ParseStats), ParseError> {
    let mut parser = LogIntervalParser::new(format, seed_year);
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        // invalid UTF-8 must only cost the affected line
        let line = String::from_utf8_lossy(&buf);
        parser.feed_line(line.trim_end_matches(['\n', '\r']), line_no);
    }

    Ok(parser.finish())
}

pub fn parse_reader<R: BufRead>(
    reader: R,
    format: LogFormat,
    seed_year: i32,
) -> Result<Vec<Interval>, ParseError> {
    parse_reader_with_stats(reader, format, seed_year).map(|(intervals, _)| intervals)
}

/// Parses a log file, seeding the year from its modification time.
pub fn parse_file_with_stats(
    path: &Path,
    format: LogFormat,
) -> Result<(Vec<Interval>, ParseStats), ParseError> {
    let year = seed_year(path)?;
    let reader = open_log(path)?;
    let (intervals, stats) = parse_reader_with_stats(reader, format, year)?;
    tracing::debug!(
        path = %path.display(),
        %format,
        seed_year = year,
        intervals = intervals.len(),
        lines = stats.lines_read,
        skipped = stats.lines_skipped,
        reboots = stats.reboots,
        suspends = stats.suspends,
        "parsed log"
    );
    Ok((intervals, stats))
}

pub fn parse_file(path: &Path, format: LogFormat) -> Result<Vec<Interval>, ParseError> {
    parse_file_with_stats(path, format).map(|(intervals, _)| intervals)
}
