//! In-memory sink
//!
//! Keeps every converted record, for tests and for embedding applications
//! that forward records themselves.

use crate::core::{Converter, ConverterKind, LevelSet, LogLevel, Record, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct MemorySink {
    records: Mutex<Vec<Record>>,
    levels: LevelSet,
    converter: Arc<dyn Converter>,
}

impl MemorySink {
    pub fn new(levels: LevelSet) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            levels,
            converter: ConverterKind::default().converter(),
        }
    }

    pub fn with_level(level: LogLevel) -> Self {
        Self::new(LevelSet::with_default(level))
    }

    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Snapshot of the records written so far
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    /// Records rendered as NDJSON lines
    pub fn lines(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(Record::to_json_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemorySink {
    /// No level rules: every level except NEVER and UNSET is kept
    fn default() -> Self {
        Self::new(LevelSet::new())
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, record: &Record) -> Result<()> {
        let converted = self.converter.convert(record.clone());
        self.records.lock().push(converted);
        Ok(())
    }

    fn levels(&self) -> Option<&LevelSet> {
        Some(&self.levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_converted_records() {
        let sink = MemorySink::default().with_converter(ConverterKind::CloudWatch.converter());
        assert!(sink.should_write(LogLevel::Trace, "main", "main"));

        sink.write(&Record::new().with_field("level", LogLevel::Warn))
            .unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.lines(), vec!["{\"level\":\"WARN\"}".to_string()]);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unrenderable_time_format_does_not_panic() {
        use crate::core::converter::CloudWatchConverter;
        use crate::core::TimestampFormat;
        use chrono::Utc;

        let converter = CloudWatchConverter::new()
            .with_timestamp_format(TimestampFormat::Custom("%Q".to_string()));
        let sink = MemorySink::default().with_converter(Arc::new(converter));

        sink.write(&Record::new().with_field("time", Utc::now()))
            .unwrap();

        let time = sink.records()[0].get_str("time").unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&time).is_ok());
    }
}
