//! Checkpoint tracking for incremental sync

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Sync cursor, in seconds since the Unix epoch.
///
/// Items saved at or after this instant have not yet been mirrored.
/// Lives in memory only, one per running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Checkpoint(i64);

impl Checkpoint {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// The current wall-clock time
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Starting checkpoint for a fresh process: `lookback` before now
    pub fn initial(lookback: Duration) -> Self {
        let lookback = i64::try_from(lookback.as_secs()).unwrap_or(i64::MAX);
        Self(Utc::now().timestamp().saturating_sub(lookback))
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Move forward to `cursor`. Never moves backwards.
    pub fn advanced_to(self, cursor: Checkpoint) -> Self {
        self.max(cursor)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{} ({})", self.0, dt.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}
