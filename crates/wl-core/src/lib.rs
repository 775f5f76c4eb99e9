//! Core domain logic for the work log.
//!
//! This crate contains the fundamental types and logic for:
//! - Log parsing: reconstructing machine activity intervals from kernel/system logs
//! - Timeline: keeping work-log entries sorted, merging new intervals, joins and merges
//! - Layout: day-view helpers (day fractions, lanes)

pub mod import;
mod layout;
pub mod logline;
pub mod parser;
pub mod timestamp;
mod types;
pub mod worklog;

pub use import::{LogSource, import_system_logs, read_intervals};
pub use layout::assign_lanes;
pub use logline::{LineError, LogFormat, LogLine};
pub use parser::{
    LogIntervalParser, ParseError, ParseStats, fix_years, parse_file, parse_file_with_stats,
    parse_reader, split_boot_sessions,
};
pub use types::{Interval, ValidationError, truncate_to_minute};
pub use worklog::{
    DEFAULT_TICK_MAX_GAP_MINUTES, MergeError, MergeSummary, WorkLogData, WorkLogEntry,
    WorkLogError,
};
