//! Fan-out to several sinks
//!
//! Each child keeps its own level rules: a record is offered to every child
//! whose rules accept the record's level, topic and scope.

use crate::core::{routing_key, LevelSet, LogLevel, LoggerError, Record, Result, Sink};
use std::sync::Arc;

#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each<F>(&self, mut op: F) -> Result<()>
    where
        F: FnMut(&dyn Sink) -> Result<()>,
    {
        let errors: Vec<LoggerError> = self
            .sinks
            .iter()
            .filter_map(|sink| op(sink.as_ref()).err())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::MultipleSinks(errors))
        }
    }
}

impl Sink for MultiSink {
    fn name(&self) -> &str {
        "multi"
    }

    /// Write to every accepting child, in order, even after a failure
    ///
    /// [`LoggerError::Unrouted`] when no child took the record.
    fn write(&self, record: &Record) -> Result<()> {
        let (level, topic, scope) = routing_key(record);
        let mut accepted = false;
        self.each(|sink| {
            if !sink.should_write(level, &topic, &scope) {
                return Ok(());
            }
            match sink.write(record) {
                Err(LoggerError::Unrouted) => Ok(()),
                result => {
                    accepted = true;
                    result
                }
            }
        })?;

        if accepted {
            Ok(())
        } else {
            Err(LoggerError::Unrouted)
        }
    }

    fn levels(&self) -> Option<&LevelSet> {
        None
    }

    fn should_write(&self, level: LogLevel, topic: &str, scope: &str) -> bool {
        self.sinks
            .iter()
            .any(|sink| sink.should_write(level, topic, scope))
    }

    /// Most verbose level among the children
    fn filter_level(&self, topic: &str, scope: &str) -> LogLevel {
        self.sinks
            .iter()
            .map(|sink| sink.filter_level(topic, scope))
            .min()
            .unwrap_or(LogLevel::Unset)
    }

    fn set_filter_level(&self, level: LogLevel, topic: &str, scope: &str) {
        for sink in &self.sinks {
            sink.set_filter_level(level, topic, scope);
        }
    }

    fn filter_more(&self) {
        for sink in &self.sinks {
            sink.filter_more();
        }
    }

    fn filter_less(&self) {
        for sink in &self.sinks {
            sink.filter_less();
        }
    }

    fn flush(&self) -> Result<()> {
        self.each(|sink| sink.flush())
    }

    fn close(&self) -> Result<()> {
        self.each(|sink| sink.close())
    }
}
