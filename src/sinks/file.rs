//! File sink implementation
//!
//! Records are appended to a buffered file. An optional background timer
//! flushes the buffer at a fixed frequency so that a quiet process still gets
//! its last lines onto disk.

use super::encode;
use crate::core::{Converter, ConverterKind, LevelSet, LogLevel, LoggerError, Record, Result, Sink};
use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

type SharedWriter = Arc<Mutex<Option<BufWriter<File>>>>;

struct FlushTimer {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl FlushTimer {
    fn start(name: String, writer: SharedWriter, frequency: Duration) -> Self {
        let (shutdown, stop) = bounded::<()>(1);
        let ticker = tick(frequency);

        let handle = thread::spawn(move || loop {
            select! {
                recv(ticker) -> _ => {
                    if let Some(writer) = writer.lock().as_mut() {
                        if let Err(e) = writer.flush() {
                            eprintln!("[LOGGER ERROR] Periodic flush of '{}' failed: {}", name, e);
                        }
                    }
                }
                recv(stop) -> _ => break,
            }
        });

        Self { shutdown, handle }
    }

    fn stop(self) {
        let _ = self.shutdown.send(());
        if self.handle.join().is_err() {
            eprintln!("[LOGGER ERROR] Flush timer thread panicked");
        }
    }
}

pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: SharedWriter,
    levels: LevelSet,
    converter: Arc<dyn Converter>,
    timer: Mutex<Option<FlushTimer>>,
}

impl std::fmt::Debug for FileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSink")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileSink {
    /// Open `path` for appending, creating it when missing
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("cannot open '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            name: path.display().to_string(),
            path,
            writer: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
            levels: LevelSet::with_default(LogLevel::Info),
            converter: ConverterKind::default().converter(),
            timer: Mutex::new(None),
        })
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

    /// Flush in the background every `frequency`; zero keeps flushing manual
    #[must_use]
    pub fn with_flush_frequency(self, frequency: Duration) -> Self {
        if let Some(previous) = self.timer.lock().take() {
            previous.stop();
        }
        if !frequency.is_zero() {
            *self.timer.lock() = Some(FlushTimer::start(
                self.name.clone(),
                Arc::clone(&self.writer),
                frequency,
            ));
        }
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }

    fn stop_timer(&self) {
        let timer = self.timer.lock().take();
        if let Some(timer) = timer {
            timer.stop();
        }
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &Record) -> Result<()> {
        let line = encode(self.converter.as_ref(), record);
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| LoggerError::SinkClosed(self.name.clone()))?;
        writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn levels(&self) -> Option<&LevelSet> {
        Some(&self.levels)
    }

    fn flush(&self) -> Result<()> {
        if let Some(writer) = self.writer.lock().as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Stop the flush timer, flush and release the file
    fn close(&self) -> Result<()> {
        self.stop_timer();
        match self.writer.lock().take() {
            Some(mut writer) => {
                writer.flush()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        self.stop_timer();
        let _ = self.flush();
    }
}
