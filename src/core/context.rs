//! Request-scoped logger passing
//!
//! Handlers receive a [`RequestContext`] explicitly instead of reaching for a
//! global logger.

use super::error::{LoggerError, Result};
use super::logger::Logger;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    logger: Option<Logger>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Store a logger, e.g. one derived with request fields
    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = Some(logger);
    }

    /// # Errors
    ///
    /// [`LoggerError::MissingContext`] when no logger was stored.
    pub fn logger(&self) -> Result<&Logger> {
        self.logger.as_ref().ok_or(LoggerError::MissingContext)
    }

    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use crate::sinks::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_missing_logger() {
        let context = RequestContext::new();
        assert!(!context.has_logger());
        assert!(matches!(context.logger(), Err(LoggerError::MissingContext)));
    }

    #[test]
    fn test_stored_logger() {
        let sink = Arc::new(MemorySink::with_level(LogLevel::Info));
        let logger = Logger::builder("api").shared_sink(sink.clone()).build().unwrap();

        let mut context = RequestContext::new();
        context.set_logger(logger.with_field("request_id", "abc"));

        context.logger().unwrap().info("handled");

        let records = sink.records();
        assert_eq!(records[0].get_str("request_id").as_deref(), Some("abc"));
    }
}
