//! Logger configuration
//!
//! Read from the environment by [`LoggerConfig::from_env`]:
//!
//! | Variable             | Meaning                                              |
//! |----------------------|------------------------------------------------------|
//! | `LOG_LEVEL`          | level pattern, e.g. `INFO;DEBUG:{auth:login}`        |
//! | `LOG_DESTINATION`    | comma separated `stdout`, `stderr`, `nil` or paths   |
//! | `LOG_CONVERTER`      | `bunyan`, `stackdriver` or `cloudwatch`              |
//! | `LOG_FLUSHFREQUENCY` | file flush interval such as `5s` or `250ms`          |
//!
//! When `LOG_LEVEL` is unset, `TRACE=1` or `DEBUG=1` lower the default level.

use super::{
    converter::ConverterKind,
    error::{LoggerError, Result},
    level_set::LevelSet,
    log_level::LogLevel,
    sink::Sink,
};
use crate::sinks::{sink_for_destination, MultiSink, STDOUT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const LEVEL_ENV: &str = "LOG_LEVEL";
pub const DESTINATION_ENV: &str = "LOG_DESTINATION";
pub const CONVERTER_ENV: &str = "LOG_CONVERTER";
pub const FLUSH_FREQUENCY_ENV: &str = "LOG_FLUSHFREQUENCY";

pub const DEFAULT_FLUSH_FREQUENCY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Filter rules, copied into every destination
    pub level: LevelSet,

    pub destinations: Vec<String>,

    pub converter: ConverterKind,

    /// How often file destinations flush; zero disables the timer
    #[serde(with = "humantime_duration")]
    pub flush_frequency: Duration,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LevelSet::with_default(LogLevel::Info),
            destinations: vec![STDOUT.to_string()],
            converter: ConverterKind::default(),
            flush_frequency: DEFAULT_FLUSH_FREQUENCY,
        }
    }
}

impl LoggerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key/value source
    ///
    /// # Example
    ///
    /// ```
    /// use chainlog::core::{LoggerConfig, LogLevel};
    ///
    /// let config = LoggerConfig::from_lookup(|key| match key {
    ///     "LOG_LEVEL" => Some("WARN;DEBUG:{db}".to_string()),
    ///     "LOG_FLUSHFREQUENCY" => Some("250ms".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.level.get("db", "pool"), LogLevel::Debug);
    /// assert_eq!(config.flush_frequency.as_millis(), 250);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(pattern) = value(LEVEL_ENV) {
            config.level = LevelSet::parse(&pattern);
        } else if value("TRACE").is_some_and(|v| is_truthy(&v)) {
            config.level = LevelSet::with_default(LogLevel::Trace);
        } else if value("DEBUG").is_some_and(|v| is_truthy(&v)) {
            config.level = LevelSet::with_default(LogLevel::Debug);
        }

        if let Some(destinations) = value(DESTINATION_ENV) {
            config.destinations = destinations
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(converter) = value(CONVERTER_ENV) {
            config.converter = converter.parse()?;
        }

        if let Some(frequency) = value(FLUSH_FREQUENCY_ENV) {
            config.flush_frequency = humantime::parse_duration(frequency.trim())
                .map_err(|e| LoggerError::config(FLUSH_FREQUENCY_ENV, e.to_string()))?;
        }

        Ok(config)
    }

    /// Open every destination, each with its own copy of the level rules
    ///
    /// # Errors
    ///
    /// The first destination that cannot be opened.
    pub fn build_sink(&self) -> Result<Arc<dyn Sink>> {
        let mut sinks = self
            .destinations
            .iter()
            .map(|destination| {
                sink_for_destination(
                    destination,
                    self.level.clone(),
                    self.converter,
                    self.flush_frequency,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        match sinks.len() {
            0 => Err(LoggerError::config(DESTINATION_ENV, "no destination given")),
            1 => Ok(sinks.remove(0)),
            _ => Ok(Arc::new(MultiSink::new(sinks))),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
