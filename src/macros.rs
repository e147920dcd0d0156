//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. Arguments are only
//! formatted when the record passes the level check.
//!
//! # Examples
//!
//! ```
//! use chainlog::prelude::*;
//! use chainlog::{error, info};
//!
//! let logger = Logger::builder("server").sink(NilSink).build()?;
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Attach an error under `err`
//! let e = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
//! error!(logger, err = e; "Cannot bind port {}", port);
//! # Ok::<(), LoggerError>(())
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_args($level, format_args!($($arg)+))
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// With a leading `err = expr;` the error is attached to the record under
/// `err` and appended to the message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
///
/// let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
/// error!(logger, err = e; "Query {} failed", 7);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, err = $err:expr; $($arg:tt)+) => {
        $logger.log_args_with($crate::LogLevel::Error, format_args!($($arg)+), &$err)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use chainlog::prelude::*;
/// # let logger = Logger::builder("app").sink(NilSink).build().unwrap();
/// use chainlog::fatal;
/// fatal!(logger, "Critical system failure");
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, err = $err:expr; $($arg:tt)+) => {
        $logger.log_args_with($crate::LogLevel::Fatal, format_args!($($arg)+), &$err)
    };
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, Logger, LoggerError};
    use crate::sinks::MemorySink;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn logger() -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::with_level(LogLevel::Trace));
        let logger = Logger::builder("macros")
            .shared_sink(sink.clone())
            .build()
            .unwrap();
        (logger, sink)
    }

    fn messages(sink: &MemorySink) -> Vec<String> {
        sink.records()
            .iter()
            .filter_map(|record| record.get_str("msg"))
            .collect()
    }

    #[test]
    fn test_log_macro() {
        let (logger, sink) = logger();
        log!(logger, LogLevel::Info, "Test message");
        log!(logger, LogLevel::Info, "Formatted: {}", 42);
        assert_eq!(messages(&sink), vec!["Test message", "Formatted: 42"]);
    }

    #[test]
    fn test_level_macros() {
        let (logger, sink) = logger();
        trace!(logger, "Value: {}", 10);
        debug!(logger, "Count: {}", 5);
        info!(logger, "Items: {}", 100);
        warn!(logger, "disk at {}%", 91);
        error!(logger, "Code: {}", 500);
        fatal!(logger, "Critical failure: {}", "system");

        let levels: Vec<_> = sink
            .records()
            .iter()
            .filter_map(|record| record.get("level").and_then(|v| v.as_level()))
            .collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Trace,
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warn,
                LogLevel::Error,
                LogLevel::Fatal
            ]
        );
        assert_eq!(messages(&sink)[3], "disk at 91%");
    }

    #[test]
    fn test_error_argument() {
        let (logger, sink) = logger();
        let e = LoggerError::other("connection reset");
        error!(logger, err = e; "Request {} failed", 3);
        fatal!(logger, err = LoggerError::MissingContext; "giving up");

        assert_eq!(
            messages(&sink),
            vec![
                "Request 3 failed: connection reset",
                "giving up: No logger found in context"
            ]
        );
        assert!(sink.records()[0].contains_key("err"));
    }

    struct Costly<'a>(&'a AtomicUsize);

    impl fmt::Display for Costly<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fetch_add(1, Ordering::SeqCst);
            write!(f, "costly")
        }
    }

    #[test]
    fn test_filtered_call_does_not_format() {
        let sink = Arc::new(MemorySink::with_level(LogLevel::Fatal));
        let logger = Logger::builder("lazy")
            .shared_sink(sink.clone())
            .build()
            .unwrap();
        let formatted = AtomicUsize::new(0);

        debug!(logger, "value {}", Costly(&formatted));
        error!(logger, err = LoggerError::MissingContext; "skipped {}", Costly(&formatted));
        assert_eq!(formatted.load(Ordering::SeqCst), 0);
        assert_eq!(logger.metrics().filtered_count(), 2);

        fatal!(logger, "value {}", Costly(&formatted));
        assert_eq!(formatted.load(Ordering::SeqCst), 1);
        assert_eq!(messages(&sink), vec!["value costly"]);
    }
}
