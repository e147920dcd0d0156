//! # chainlog
//!
//! Structured, leveled logging that writes newline-delimited JSON.
//!
//! ## Features
//!
//! - **Composable loggers**: derive child loggers that add fields, topics and
//!   redaction rules without touching their parent
//! - **Topic/scope filtering**: per-sink level rules such as
//!   `INFO;DEBUG:{auth:login}`
//! - **Redaction**: pattern and key based masking applied before output
//! - **Viewer formats**: bunyan, Google Cloud Logging and AWS CloudWatch layouts
//! - **Thread Safe**: one logger chain can be shared by every thread
//!
//! ## Example
//!
//! ```
//! use chainlog::prelude::*;
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new(LevelSet::parse("INFO;DEBUG:{auth}")));
//! let logger = Logger::builder("api")
//!     .shared_sink(sink.clone())
//!     .redactor(Redactor::credit_card())
//!     .build()?;
//!
//! let auth = logger.with_child("auth", "login", [("user", "jo")]);
//! auth.debug("checking card 4111 1111 1111 1111");
//! logger.debug("not written");
//!
//! let records = sink.records();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].get_str("msg").as_deref(), Some("checking card REDACTED"));
//! # Ok::<(), chainlog::LoggerError>(())
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        ConverterKind, KeyRedactor, LevelSet, LogLevel, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, Record, Redactor, RequestContext, Result, Sink, Value,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, MemorySink, MultiSink, NilSink};
}

pub use crate::core::{
    Converter, ConverterKind, KeyRedactor, LevelSet, LogLevel, Logger, LoggerBuilder,
    LoggerConfig, LoggerError, LoggerMetrics, Record, Redaction, Redactor, RequestContext, Result,
    Sink, TimestampFormat, TopicScope, Value,
};
pub use sinks::{ConsoleSink, FileSink, MemorySink, MultiSink, NilSink};
