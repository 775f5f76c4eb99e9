//! Reading activity from several system logs at once.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logline::LogFormat;
use crate::parser::{fix_years, parse_file_with_stats};
use crate::types::Interval;
use crate::worklog::{MergeError, MergeSummary, WorkLogData};

/// A log file and the layout it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSource {
    pub path: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
}

impl LogSource {
    pub fn new(path: impl Into<PathBuf>, format: LogFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Rotated kernel log first, then the live one.
    pub fn default_sources() -> Vec<Self> {
        vec![
            Self::new("/var/log/kern.log.1", LogFormat::Kern),
            Self::new("/var/log/kern.log", LogFormat::Kern),
        ]
    }
}

/// Parses every source in priority order and concatenates the intervals.
///
/// Unavailable sources are skipped for this cycle.
pub fn read_intervals(sources: &[LogSource]) -> Vec<Interval> {
    let mut intervals = Vec::new();
    for source in sources {
        match parse_file_with_stats(&source.path, source.format) {
            Ok((found, stats)) => {
                if stats.lines_skipped > 0 {
                    tracing::info!(
                        path = %source.path.display(),
                        skipped = stats.lines_skipped,
                        "some log lines could not be parsed"
                    );
                }
                intervals.extend(found);
            }
            Err(error) => {
                tracing::warn!(path = %source.path.display(), %error, "log source unavailable");
            }
        }
    }
    fix_years(&mut intervals);
    intervals
}

/// Reads the sources and merges the result into `data`.
pub fn import_system_logs(
    data: &mut WorkLogData,
    sources: &[LogSource],
    work_default: bool,
) -> Result<MergeSummary, MergeError> {
    let intervals = read_intervals(sources);
    data.merge_intervals(&intervals, work_default)
}
