//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wl_core::LogFormat;

/// Work log.
///
/// Reconstructs when the machine was in use from kernel/system logs and keeps
/// an editable timeline of work and break entries.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the activity intervals found in log files.
    Scan {
        /// Log layout of the files.
        #[arg(long, value_enum, default_value_t = FormatArg::Kern)]
        format: FormatArg,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Log files to scan (`.gz` rotations are accepted).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Merge intervals from the configured system logs into the work log.
    Import {
        /// Mark the newest created entry as work.
        #[arg(long, conflicts_with = "break_")]
        work: bool,

        /// Mark the newest created entry as a break.
        #[arg(long = "break", id = "break_")]
        break_: bool,
    },

    /// List work-log entries.
    List {
        /// Only entries touching this day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add an entry.
    Add {
        /// Start time (YYYY-MM-DD HH:MM).
        #[arg(long)]
        start: String,

        /// End time (YYYY-MM-DD HH:MM).
        #[arg(long)]
        end: String,

        /// Mark the entry as work (default: break).
        #[arg(long)]
        work: bool,

        /// Free-text description.
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove the entry at the given list index.
    Remove { index: usize },

    /// Move an entry boundary onto its neighbour.
    Join {
        index: usize,
        #[arg(value_enum)]
        direction: Direction,
    },

    /// Absorb an entry into its neighbour.
    Merge {
        index: usize,
        #[arg(value_enum)]
        direction: Direction,
    },

    /// Extend the most recent entry up to now.
    Tick,

    /// Show current work-log status.
    Status,
}

/// Neighbour selector for join/merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
}

/// Log format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Kern,
    Syslog,
}

impl From<FormatArg> for LogFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Kern => Self::Kern,
            FormatArg::Syslog => Self::Syslog,
        }
    }
}
