//! Cadence presets and tick arithmetic

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How often a scheduled task runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cadence {
    /// `@hourly`
    Hourly,
    /// `@daily`
    #[default]
    Daily,
    /// `@weekly`
    Weekly,
}

impl Cadence {
    /// Preset name, e.g. `@daily`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "@hourly",
            Self::Daily => "@daily",
            Self::Weekly => "@weekly",
        }
    }

    /// Time between ticks
    pub fn period(self) -> Duration {
        match self {
            Self::Hourly => Duration::hours(1),
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::weeks(1),
        }
    }

    /// First tick strictly after `after`, on the grid anchored at `start`
    ///
    /// Ticks between `start` and `after` are skipped, never replayed.
    pub fn next_tick(self, start: DateTime<Utc>, after: DateTime<Utc>) -> DateTime<Utc> {
        if after < start {
            return start;
        }

        let period = self.period();
        let elapsed = after - start;
        let periods = elapsed.num_seconds() / period.num_seconds() + 1;
        start + period * periods as i32
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "@hourly" => Ok(Self::Hourly),
            "@daily" => Ok(Self::Daily),
            "@weekly" => Ok(Self::Weekly),
            other => Err(Error::invalid_config(
                "schedule.interval",
                format!("unknown preset '{other}' (expected @hourly, @daily or @weekly)"),
            )),
        }
    }
}

impl TryFrom<String> for Cadence {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Cadence> for String {
    fn from(cadence: Cadence) -> Self {
        cadence.as_str().to_string()
    }
}
