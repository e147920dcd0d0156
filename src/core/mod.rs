//! Core logger types and traits

pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod level_set;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod redactor;
pub mod sink;
pub mod timestamp;
pub mod topic_scope;
pub mod value;

pub use config::LoggerConfig;
pub use context::RequestContext;
pub use converter::{
    BunyanConverter, CloudWatchConverter, Converter, ConverterKind, StackDriverConverter,
};
pub use error::{LoggerError, Result};
pub use level_set::LevelSet;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::LoggerMetrics;
pub use record::Record;
pub use redactor::{redact_keys, redact_record, KeyRedactor, Redaction, Redactor, REDACTED};
pub use sink::{routing_key, Sink};
pub use timestamp::TimestampFormat;
pub use topic_scope::TopicScope;
pub use value::{LazyValue, Redactable, Value};
