//! Line-level parsing of kernel and syslog files.

use std::fmt;
use std::num::ParseFloatError;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::WallClock;
use crate::types::ValidationError;

/// `<ts> <host> <process>[<pid>]: <message>`
static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<timestamp>[A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(?P<host>\S+)\s+(?P<process>[^\s\[:]+)(?:\[\d+\])?:\s?(?P<message>.*)$",
    )
    .unwrap()
});

/// `[<mono>] <message>` inside a kernel line.
static KERNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*(?P<mono>[^\]]*)\]\s?(?P<message>.*)$").unwrap());

/// A second header inside the message means two lines were written without a newline.
static JOINED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\S+\s+[^\s\[:]+(?:\[\d+\])?:").unwrap()
});

/// Process tag of kernel-originated lines.
pub const KERNEL_PROCESS: &str = "kernel";

/// Supported log layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `kern.log`: only `kernel:` lines, each with a `[mono]` prefix.
    #[default]
    Kern,
    /// `syslog` / `messages`: any process; kernel lines are nested inside.
    Syslog,
}

impl LogFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::Syslog => "syslog",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kern" => Ok(Self::Kern),
            "syslog" => Ok(Self::Syslog),
            _ => Err(ValidationError::InvalidLogFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Why a single line was rejected. Never fatal for the file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("line does not match the log pattern")]
    NoMatch,
    #[error("line contains a second log header (joined lines)")]
    JoinedLines,
    #[error("unknown month name: {0}")]
    UnknownMonth(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid monotonic timestamp {value:?}: {source}")]
    InvalidMonotonic {
        value: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("monotonic timestamp out of range: {0}")]
    MonotonicOutOfRange(String),
}

/// One parsed log line, borrowing from the line buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine<'a> {
    pub timestamp: &'a str,
    pub wall: WallClock,
    pub host: &'a str,
    pub process: &'a str,
    /// Seconds since boot; present on kernel lines only.
    pub mono: Option<f64>,
    pub message: &'a str,
}

impl<'a> LogLine<'a> {
    /// Parses a raw line in the given format.
    pub fn parse(line: &'a str, format: LogFormat) -> Result<Self, LineError> {
        let caps = HEADER_RE.captures(line).ok_or(LineError::NoMatch)?;
        let named = |name: &str| caps.name(name).map_or("", |m| m.as_str());

        let timestamp = named("timestamp");
        let host = named("host");
        let process = named("process");
        let mut message = named("message");

        if JOINED_RE.is_match(message) {
            return Err(LineError::JoinedLines);
        }

        let is_kernel = process == KERNEL_PROCESS;
        if format == LogFormat::Kern && !is_kernel {
            return Err(LineError::NoMatch);
        }

        let mut mono = None;
        if is_kernel {
            match KERNEL_RE.captures(message) {
                Some(kcaps) => {
                    let raw = kcaps.name("mono").map_or("", |m| m.as_str()).trim();
                    let value = raw
                        .parse::<f64>()
                        .map_err(|source| LineError::InvalidMonotonic {
                            value: raw.to_string(),
                            source,
                        })?;
                    if !value.is_finite() || value < 0.0 {
                        return Err(LineError::MonotonicOutOfRange(raw.to_string()));
                    }
                    mono = Some(value);
                    message = kcaps.name("message").map_or("", |m| m.as_str());
                }
                None if format == LogFormat::Kern => return Err(LineError::NoMatch),
                // printk timestamps disabled: still a valid activity line
                None => {}
            }
        }

        let wall = WallClock::parse(timestamp)?;

        Ok(Self {
            timestamp,
            wall,
            host,
            process,
            mono,
            message,
        })
    }

    pub fn is_kernel(&self) -> bool {
        self.process == KERNEL_PROCESS
    }
}
