//! Import command for merging system-log activity into the work log.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;
use wl_core::{MergeSummary, import_system_logs};

use super::util::{WorkLogLock, open_database};
use crate::Config;

/// Metadata key recording when the last import ran.
pub const LAST_IMPORT_KEY: &str = "last_import";

/// Runs one import cycle under the work-log lock.
///
/// `work_default` overrides the configured flag for the newest created entry.
/// When an interval overlaps several entries nothing is saved.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    work_default: Option<bool>,
) -> Result<MergeSummary> {
    let work_default = work_default.unwrap_or(config.work_default);

    let _lock = WorkLogLock::acquire(config)?;
    let mut db = open_database(config)?;
    let mut data = db.load_worklog().context("failed to load work log")?;

    let summary = import_system_logs(&mut data, &config.sources, work_default)
        .context("import aborted, work log left unchanged")?;

    db.save_worklog(&data).context("failed to save work log")?;
    let now = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S");
    db.set_meta(LAST_IMPORT_KEY, &now.to_string())?;

    tracing::info!(
        created = summary.created,
        extended = summary.extended,
        discarded = summary.discarded,
        "import complete"
    );
    writeln!(
        writer,
        "Imported: {} created, {} extended, {} already recorded",
        summary.created, summary.extended, summary.discarded
    )?;
    Ok(summary)
}
