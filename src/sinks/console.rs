//! Console sink implementation

use super::{encode, STDERR, STDOUT};
use crate::core::{Converter, ConverterKind, LevelSet, LogLevel, Record, Result, Sink};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// NDJSON on standard output or standard error
///
/// # Example
///
/// ```
/// use chainlog::sinks::ConsoleSink;
/// use chainlog::{ConverterKind, LevelSet};
///
/// let sink = ConsoleSink::stderr()
///     .with_levels(LevelSet::parse("WARN;DEBUG:{db}"))
///     .with_converter(ConverterKind::StackDriver.converter());
/// ```
pub struct ConsoleSink {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
    levels: LevelSet,
    converter: Arc<dyn Converter>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::with_writer(STDOUT, io::stdout())
    }

    pub fn stderr() -> Self {
        Self::with_writer(STDERR, io::stderr())
    }

    /// Console-style sink over any writer, defaults to INFO and bunyan output
    pub fn with_writer<W: Write + Send + 'static>(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(Box::new(writer)),
            levels: LevelSet::with_default(LogLevel::Info),
            converter: ConverterKind::default().converter(),
        }
    }

    #[must_use]
    pub fn with_levels(mut self, levels: LevelSet) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.with_levels(LevelSet::with_default(level))
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &Record) -> Result<()> {
        let line = encode(self.converter.as_ref(), record);
        self.writer.lock().write_all(line.as_bytes())?;
        Ok(())
    }

    fn levels(&self) -> Option<&LevelSet> {
        Some(&self.levels)
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_converted_lines() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer("buffer", buffer.clone())
            .with_converter(ConverterKind::StackDriver.converter());

        let record = Record::new()
            .with_field("level", LogLevel::Error)
            .with_field("msg", "failed");
        sink.write(&record).unwrap();
        sink.write(&record).unwrap();
        sink.flush().unwrap();

        let output = String::from_utf8(buffer.0.lock().clone()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let json: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(json["severity"], "ERROR");
        assert_eq!(json["message"], "failed");
        assert_eq!(record.get_str("msg").as_deref(), Some("failed"));
    }

    #[test]
    fn test_default_level_is_info() {
        let sink = ConsoleSink::stdout();
        assert_eq!(sink.name(), "stdout");
        assert!(sink.should_write(LogLevel::Info, "any", "any"));
        assert!(!sink.should_write(LogLevel::Debug, "any", "any"));
    }
}
