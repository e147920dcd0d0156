//! Sink that discards everything

use crate::core::{LogLevel, Record, Result, Sink};

#[derive(Debug, Clone, Copy, Default)]
pub struct NilSink;

impl Sink for NilSink {
    fn name(&self) -> &str {
        "nil"
    }

    fn write(&self, _record: &Record) -> Result<()> {
        Ok(())
    }

    fn should_write(&self, _level: LogLevel, _topic: &str, _scope: &str) -> bool {
        false
    }
}
