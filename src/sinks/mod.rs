//! Sink implementations

pub mod console;
pub mod file;
pub mod memory;
pub mod multi;
pub mod nil;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use memory::MemorySink;
pub use multi::MultiSink;
pub use nil::NilSink;

pub use crate::core::Sink;

use crate::core::{Converter, ConverterKind, LevelSet, Record, Result};
use std::sync::Arc;
use std::time::Duration;

/// Destination names understood by [`sink_for_destination`]
pub const STDOUT: &str = "stdout";
pub const STDERR: &str = "stderr";
pub const NIL: &str = "nil";

/// Open the sink named by a destination string
///
/// `stdout`, `stderr` and `nil` select the matching sink; anything else is a
/// file path opened in append mode.
pub fn sink_for_destination(
    destination: &str,
    levels: LevelSet,
    converter: ConverterKind,
    flush_frequency: Duration,
) -> Result<Arc<dyn Sink>> {
    let converter = converter.converter();
    let sink: Arc<dyn Sink> = match destination.trim() {
        STDOUT => Arc::new(
            ConsoleSink::stdout()
                .with_levels(levels)
                .with_converter(converter),
        ),
        STDERR => Arc::new(
            ConsoleSink::stderr()
                .with_levels(levels)
                .with_converter(converter),
        ),
        NIL => Arc::new(NilSink),
        path => Arc::new(
            FileSink::new(path)?
                .with_levels(levels)
                .with_converter(converter)
                .with_flush_frequency(flush_frequency),
        ),
    };
    Ok(sink)
}

/// One NDJSON line for a record, after conversion
pub(crate) fn encode(converter: &dyn Converter, record: &Record) -> String {
    let mut line = converter.convert(record.clone()).to_json_string();
    line.push('\n');
    line
}
