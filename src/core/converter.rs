//! Record converters for specific log viewers
//!
//! A converter reshapes a finalized record (after redaction) for the schema
//! a viewer expects. Records are taken by value, callers never see the change.

use super::error::LoggerError;
use super::log_level::LogLevel;
use super::record::{Record, LEVEL_FIELD, MESSAGE_FIELD, TIME_FIELD};
use super::timestamp::TimestampFormat;
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub trait Converter: Send + Sync {
    fn convert(&self, record: Record) -> Record;
}

/// Bunyan layout: numeric levels, `msg`, RFC 3339 `time`, and `v: 0`
#[derive(Debug, Clone, Copy, Default)]
pub struct BunyanConverter;

impl Converter for BunyanConverter {
    fn convert(&self, mut record: Record) -> Record {
        record.set("v", 0);
        record
    }
}

/// Google Cloud Logging layout: `severity` and `message`
#[derive(Debug, Clone, Copy, Default)]
pub struct StackDriverConverter;

impl StackDriverConverter {
    pub fn severity(level: LogLevel) -> &'static str {
        match level {
            LogLevel::Never | LogLevel::Unset => "DEFAULT",
            LogLevel::Trace | LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "CRITICAL",
            LogLevel::Always => "NOTICE",
        }
    }
}

impl Converter for StackDriverConverter {
    fn convert(&self, mut record: Record) -> Record {
        if let Some(level) = record.remove(LEVEL_FIELD).as_ref().and_then(Value::as_level) {
            record.replace("severity", Self::severity(level));
        }
        record.rename(MESSAGE_FIELD, "message");
        record
    }
}

/// AWS CloudWatch layout: level names and epoch-millisecond `time`
#[derive(Debug, Clone)]
pub struct CloudWatchConverter {
    timestamp_format: TimestampFormat,
}

impl CloudWatchConverter {
    pub fn new() -> Self {
        Self {
            timestamp_format: TimestampFormat::UnixMillis,
        }
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Default for CloudWatchConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for CloudWatchConverter {
    fn convert(&self, mut record: Record) -> Record {
        if let Some(level) = record.get(LEVEL_FIELD).and_then(Value::as_level) {
            record.replace(LEVEL_FIELD, level.to_str());
        }
        if let Some(Value::Time(time)) = record.get(TIME_FIELD).cloned() {
            record.replace(TIME_FIELD, self.timestamp_format.render(&time));
        }
        record
    }
}

/// Closed set of converters selectable by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConverterKind {
    #[default]
    Bunyan,
    StackDriver,
    CloudWatch,
}

impl ConverterKind {
    pub fn converter(&self) -> Arc<dyn Converter> {
        match self {
            ConverterKind::Bunyan => Arc::new(BunyanConverter),
            ConverterKind::StackDriver => Arc::new(StackDriverConverter),
            ConverterKind::CloudWatch => Arc::new(CloudWatchConverter::new()),
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            ConverterKind::Bunyan => "bunyan",
            ConverterKind::StackDriver => "stackdriver",
            ConverterKind::CloudWatch => "cloudwatch",
        }
    }
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for ConverterKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "default" | "bunyan" => Ok(ConverterKind::Bunyan),
            "stackdriver" | "google" | "gcp" => Ok(ConverterKind::StackDriver),
            "cloudwatch" | "aws" => Ok(ConverterKind::CloudWatch),
            other => Err(LoggerError::config(
                "converter",
                format!("unknown converter '{}'", other),
            )),
        }
    }
}
