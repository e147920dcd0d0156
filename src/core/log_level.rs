//! Log level definitions
//!
//! Levels are totally ordered: `Unset < Trace < Debug < Info < Warn < Error < Fatal < Always`.
//! `Never` sorts below everything and is never written, whatever the filter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum LogLevel {
    Never = -1,
    #[default]
    Unset = 0,
    Trace = 10,
    Debug = 20,
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
    Always = 70,
}

const ORDERED: [LogLevel; 9] = [
    LogLevel::Never,
    LogLevel::Unset,
    LogLevel::Trace,
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Error,
    LogLevel::Fatal,
    LogLevel::Always,
];

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Never => "NEVER",
            LogLevel::Unset => "UNSET",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Always => "ALWAYS",
        }
    }

    /// Numeric value as written by bunyan-compatible viewers
    #[inline]
    pub fn as_i64(&self) -> i64 {
        *self as i8 as i64
    }

    /// Parse a level name, case-insensitively
    ///
    /// Unknown names resolve to [`LogLevel::Never`] instead of failing, so a
    /// misspelled rule disables output rather than aborting configuration.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "UNSET" => LogLevel::Unset,
            "TRACE" => LogLevel::Trace,
            "DEBUG" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            "FATAL" => LogLevel::Fatal,
            "ALWAYS" => LogLevel::Always,
            _ => LogLevel::Never,
        }
    }

    /// Map a bunyan numeric level back to a level
    ///
    /// Values above `Fatal` are `Always`, negative values are `Never`.
    pub fn from_i64(value: i64) -> Self {
        match value {
            v if v < 0 => LogLevel::Never,
            0 => LogLevel::Unset,
            1..=10 => LogLevel::Trace,
            11..=20 => LogLevel::Debug,
            21..=30 => LogLevel::Info,
            31..=40 => LogLevel::Warn,
            41..=50 => LogLevel::Error,
            51..=60 => LogLevel::Fatal,
            _ => LogLevel::Always,
        }
    }

    /// Tell whether a message at this level passes the given filter
    pub fn should_write(&self, filter: LogLevel) -> bool {
        if matches!(self, LogLevel::Never | LogLevel::Unset) {
            return false;
        }
        match filter {
            LogLevel::Always | LogLevel::Unset => true,
            LogLevel::Never => false,
            filter => *self >= filter,
        }
    }

    /// The next, more severe, level (saturates at `Always`)
    pub fn next(&self) -> Self {
        let idx = self.index();
        ORDERED[(idx + 1).min(ORDERED.len() - 1)]
    }

    /// The previous, less severe, level (saturates at `Never`)
    pub fn previous(&self) -> Self {
        ORDERED[self.index().saturating_sub(1)]
    }

    fn index(&self) -> usize {
        ORDERED.iter().position(|level| level == self).unwrap_or(0)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LogLevel::from_name(s))
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(LogLevel::from_name(&name))
    }
}
