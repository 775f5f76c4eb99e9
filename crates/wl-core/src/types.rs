//! Core type definitions with validation.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The interval ends before it starts.
    #[error("interval end {end} precedes start {start}")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    /// Invalid log format name.
    #[error("invalid log format: {value}")]
    InvalidLogFormat { value: String },
}

/// A contiguous period during which the machine was up and logging.
///
/// Intervals handed out by the parser always satisfy `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Creates a new interval after validation.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns true when both ranges share at least one instant (bounds inclusive).
    #[must_use]
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start <= end && start <= self.end
    }

    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Drops seconds and sub-second precision.
///
/// Work-log timestamps are kept at minute resolution.
#[must_use]
pub fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_nanosecond(0)
        .and_then(|v| v.with_second(0))
        .unwrap_or(value)
}
