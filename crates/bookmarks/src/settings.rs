//! Settings loading for the sync daemon
//!
//! Values are read from (later sources win):
//! 1. JSON file (~/.config/pocketsync/settings.json), if present
//! 2. Environment variables

use anyhow::{Result, bail};
use log::{LevelFilter, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings filename in the pocketsync config directory
const SETTINGS_FILE: &str = "settings.json";

/// Schedule used when none is configured or the configured one is invalid
pub const DEFAULT_SCHEDULE_TIME: &str = "30m";

/// Everything the daemon needs to run
#[derive(Clone)]
pub struct Settings {
    pub pocket_consumer_key: String,
    pub pocket_access_token: String,
    pub linkding_access_token: String,
    pub linkding_url: String,
    /// Time between ticks; also the initial lookback window
    pub schedule: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("pocket_consumer_key", &"<redacted>")
            .field("pocket_access_token", &"<redacted>")
            .field("linkding_access_token", &"<redacted>")
            .field("linkding_url", &self.linkding_url)
            .field("schedule", &self.schedule)
            .finish()
    }
}

/// Settings file format
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    pocket_consumer_key: Option<String>,
    pocket_access_token: Option<String>,
    linkding_access_token: Option<String>,
    linkding_url: Option<String>,
    schedule_time: Option<String>,
}

impl Settings {
    /// Load settings from the default settings file (if any) and the environment
    pub fn load() -> Result<Self> {
        let file = if config::config_exists(SETTINGS_FILE) {
            config::load_json(SETTINGS_FILE)?
        } else {
            SettingsFile::default()
        };
        Self::resolve(file, env_var)
    }

    /// Load settings from a specific JSON file, with environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let file: SettingsFile = config::load_json_file(path)?;
        Self::resolve(file, env_var)
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(SettingsFile::default(), lookup)
    }

    /// Get the default settings file path (~/.config/pocketsync/settings.json)
    pub fn default_settings_path() -> Option<PathBuf> {
        config::config_path(SETTINGS_FILE)
    }

    fn resolve<F>(file: SettingsFile, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str, from_file: Option<String>| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .or(from_file.filter(|v| !v.is_empty()))
        };
        let require = |name: &str, from_file: Option<String>| match pick(name, from_file) {
            Some(value) => Ok(value),
            None => bail!("{name} is not set"),
        };

        let pocket_consumer_key = require("POCKET_CONSUMER_KEY", file.pocket_consumer_key)?;
        let pocket_access_token = require("POCKET_ACCESS_TOKEN", file.pocket_access_token)?;
        let linkding_access_token = require("LINKDING_ACCESS_TOKEN", file.linkding_access_token)?;
        let linkding_url = require("LINKDING_URL", file.linkding_url)?;

        let schedule_time = pick("SCHEDULE_TIME", file.schedule_time);
        let schedule = parse_schedule(schedule_time.as_deref());

        Ok(Self {
            pocket_consumer_key,
            pocket_access_token,
            linkding_access_token,
            linkding_url,
            schedule,
        })
    }
}

/// Parse a schedule string, falling back to [`DEFAULT_SCHEDULE_TIME`] when it
/// is missing, invalid or zero
pub fn parse_schedule(value: Option<&str>) -> Duration {
    let default = || {
        config::parse_duration(DEFAULT_SCHEDULE_TIME).unwrap_or(Duration::from_secs(30 * 60))
    };
    let Some(value) = value else {
        return default();
    };

    match config::parse_duration(value) {
        Ok(duration) if !duration.is_zero() => duration,
        Ok(_) => {
            warn!("SCHEDULE_TIME must be positive, using {DEFAULT_SCHEDULE_TIME}");
            default()
        }
        Err(e) => {
            warn!("Invalid SCHEDULE_TIME {value:?} ({e}), using {DEFAULT_SCHEDULE_TIME}");
            default()
        }
    }
}

/// Map a `LOG_LEVEL` value to a filter; unknown or missing values mean `info`
pub fn parse_log_level(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("debug") => LevelFilter::Debug,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
