//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wl_core::{DEFAULT_TICK_MAX_GAP_MINUTES, LogSource};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// System logs to import from, in priority order.
    pub sources: Vec<LogSource>,

    /// `work` flag given to the newest entry created by an import.
    pub work_default: bool,

    /// How long after its end the recent entry may still be extended by `wl tick`.
    pub tick_max_gap_minutes: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("sources", &self.sources.len())
            .field("work_default", &self.work_default)
            .field("tick_max_gap_minutes", &self.tick_max_gap_minutes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("worklog.db"),
            sources: LogSource::default_sources(),
            work_default: true,
            tick_max_gap_minutes: DEFAULT_TICK_MAX_GAP_MINUTES,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WL_*)
        figment = figment.merge(Env::prefixed("WL_"));

        figment.extract()
    }

    pub fn tick_max_gap(&self) -> Duration {
        Duration::minutes(self.tick_max_gap_minutes)
    }

    /// Lock file guarding the database against concurrent modification.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .database_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        self.database_path.with_file_name(name)
    }
}

/// Returns the platform-specific config directory for wl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wl"))
}

/// Returns the platform-specific data directory for wl.
///
/// On Linux: `~/.local/share/wl`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("wl"))
}
