//! Logger composition chain
//!
//! A [`Logger`] is a node holding a record fragment and the redaction rules
//! added at that node, plus a link to its parent. Deriving never touches the
//! parent, so a logger can be cloned and shared between threads freely. The
//! root of every chain holds the sink, the identity fields and the metrics.
//!
//! Emitting walks the chain once: the fragment closest to the call wins, the
//! identity fields set at the root win over everything.

use super::{
    config::LoggerConfig,
    converter::ConverterKind,
    error::{LoggerError, Result},
    level_set::LevelSet,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    record::{
        Record, ERROR_FIELD, HOSTNAME_FIELD, LEVEL_FIELD, MESSAGE_FIELD, NAME_FIELD, PID_FIELD,
        SCOPE_FIELD, TID_FIELD, TIME_FIELD, TOPIC_FIELD,
    },
    redactor::{redact_record, KeyRedactor, Redaction, Redactor},
    sink::Sink,
    topic_scope::{DEFAULT_SCOPE, DEFAULT_TOPIC},
    value::Value,
};
use crate::sinks::ConsoleSink;
use chrono::Utc;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "localhost".to_string())
}

struct RootState {
    name: String,
    sink: Arc<dyn Sink>,
    identity: Record,
    metrics: LoggerMetrics,
}

struct Node {
    parent: Option<Arc<Node>>,
    root: Arc<RootState>,
    record: Record,
    redactions: Vec<Redaction>,
    /// Leaf-most `topic` of the chain
    topic: String,
    /// Leaf-most `scope` of the chain
    scope: String,
}

impl Node {
    fn ancestors(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(Some(self), |node| node.parent.as_deref())
    }
}

/// Structured logger bound to a sink
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use chainlog::{Logger, LogLevel};
/// use chainlog::sinks::MemorySink;
///
/// let sink = Arc::new(MemorySink::with_level(LogLevel::Info));
/// let logger = Logger::builder("billing")
///     .shared_sink(sink.clone())
///     .build()
///     .unwrap();
///
/// let request = logger.with_field("request_id", "r-42");
/// request.warn("disk at 91%");
/// request.debug("not written");
///
/// let records = sink.records();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].get_str("request_id").as_deref(), Some("r-42"));
/// ```
#[derive(Clone)]
pub struct Logger {
    node: Arc<Node>,
}

impl Logger {
    /// Logger configured from the process environment
    ///
    /// Falls back to INFO on standard output when the environment holds an
    /// invalid configuration; the problem is reported on standard error.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let config = LoggerConfig::from_env().unwrap_or_else(|e| {
            eprintln!("[LOGGER ERROR] Invalid logging environment: {}", e);
            LoggerConfig::default()
        });
        match config.build_sink() {
            Ok(sink) => Self::root(name, sink, Record::new(), Vec::new()),
            Err(e) => {
                eprintln!("[LOGGER ERROR] Cannot open log destination: {}", e);
                let sink = Arc::new(ConsoleSink::stdout().with_levels(config.level));
                Self::root(name, sink, Record::new(), Vec::new())
            }
        }
    }

    /// Logger built from an explicit configuration
    pub fn from_config(name: impl Into<String>, config: &LoggerConfig) -> Result<Self> {
        Ok(Self::root(
            name.into(),
            config.build_sink()?,
            Record::new(),
            Vec::new(),
        ))
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    fn root(
        name: String,
        sink: Arc<dyn Sink>,
        record: Record,
        redactions: Vec<Redaction>,
    ) -> Self {
        let mut identity = Record::new();
        identity
            .set(NAME_FIELD, name.as_str())
            .set(HOSTNAME_FIELD, local_hostname())
            .set(PID_FIELD, std::process::id())
            .set(TID_FIELD, Value::lazy(|| Value::from(current_thread_id())));

        let topic = record
            .get_str(TOPIC_FIELD)
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let scope = record
            .get_str(SCOPE_FIELD)
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        let root = Arc::new(RootState {
            name,
            sink,
            identity,
            metrics: LoggerMetrics::new(),
        });

        Self {
            node: Arc::new(Node {
                parent: None,
                root,
                record,
                redactions,
                topic,
                scope,
            }),
        }
    }

    fn derive(&self, record: Record, redactions: Vec<Redaction>) -> Self {
        let topic = record
            .get_str(TOPIC_FIELD)
            .unwrap_or_else(|| self.node.topic.clone());
        let scope = record
            .get_str(SCOPE_FIELD)
            .unwrap_or_else(|| self.node.scope.clone());

        Self {
            node: Arc::new(Node {
                parent: Some(Arc::clone(&self.node)),
                root: Arc::clone(&self.node.root),
                record,
                redactions,
                topic,
                scope,
            }),
        }
    }

    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.derive(Record::new().with_field(key, value), Vec::new())
    }

    #[must_use]
    pub fn with_fields<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.derive(fields.into_iter().collect(), Vec::new())
    }

    #[must_use]
    pub fn with_record(&self, record: Record) -> Self {
        self.derive(record, Vec::new())
    }

    #[must_use]
    pub fn with_topic(&self, topic: impl Into<Value>) -> Self {
        self.with_field(TOPIC_FIELD, topic)
    }

    #[must_use]
    pub fn with_scope(&self, scope: impl Into<Value>) -> Self {
        self.with_field(SCOPE_FIELD, scope)
    }

    /// Topic, scope and extra fields in a single node
    #[must_use]
    pub fn with_child<T, S, I, K, V>(&self, topic: T, scope: S, fields: I) -> Self
    where
        T: Into<Value>,
        S: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Record::new();
        record.set(TOPIC_FIELD, topic).set(SCOPE_FIELD, scope);
        for (key, value) in fields {
            record.set(key, value);
        }
        self.derive(record, Vec::new())
    }

    /// Add a redaction rule applied to everything emitted below this node
    #[must_use]
    pub fn with_redactor(&self, rule: impl Into<Redaction>) -> Self {
        self.derive(Record::new(), vec![rule.into()])
    }

    #[must_use]
    pub fn with_redacted_keys<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_redactor(KeyRedactor::new(keys))
    }

    pub fn name(&self) -> &str {
        &self.node.root.name
    }

    pub fn topic(&self) -> &str {
        &self.node.topic
    }

    pub fn scope(&self) -> &str {
        &self.node.scope
    }

    /// Field visible from this node, leaf-most value first
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.node
            .root
            .identity
            .get(key)
            .or_else(|| self.node.ancestors().find_map(|node| node.record.get(key)))
    }

    /// Every field this logger adds to its records
    pub fn fields(&self) -> Record {
        self.flatten(&Record::new())
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.node.root.metrics
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Error record with `error` attached under `err` and appended to the message
    pub fn error_with(&self, message: impl Into<String>, error: &dyn std::error::Error) {
        self.emit(LogLevel::Error, || message.into(), Some(error));
    }

    pub fn fatal_with(&self, message: impl Into<String>, error: &dyn std::error::Error) {
        self.emit(LogLevel::Fatal, || message.into(), Some(error));
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(level, || message.into(), None);
    }

    /// Log preformatted arguments, rendered only if the record is written
    ///
    /// The logging macros expand to this, so a filtered call never formats.
    pub fn log_args(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        self.emit(level, || args.to_string(), None);
    }

    pub fn log_args_with(
        &self,
        level: LogLevel,
        args: fmt::Arguments<'_>,
        error: &dyn std::error::Error,
    ) {
        self.emit(level, || args.to_string(), Some(error));
    }

    /// Whether a record at `level` would reach the sink from this node
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.node
            .root
            .sink
            .should_write(level, &self.node.topic, &self.node.scope)
    }

    fn emit<F>(&self, level: LogLevel, message: F, error: Option<&dyn std::error::Error>)
    where
        F: FnOnce() -> String,
    {
        let root = &self.node.root;
        if !self.is_enabled(level) {
            root.metrics.record_filtered();
            return;
        }

        let mut entry = Record::new();
        entry.set(TIME_FIELD, Utc::now()).set(LEVEL_FIELD, level);
        match error {
            Some(error) => {
                entry
                    .set(MESSAGE_FIELD, format!("{}: {}", message(), error))
                    .set(ERROR_FIELD, Value::from_error(error));
            }
            None => {
                entry.set(MESSAGE_FIELD, message());
            }
        }

        match panic::catch_unwind(AssertUnwindSafe(|| Sink::write(self, &entry))) {
            Ok(Ok(())) => {
                root.metrics.record_logged();
            }
            Ok(Err(LoggerError::Unrouted)) => {
                root.metrics.record_filtered();
            }
            Ok(Err(e)) => {
                eprintln!("[LOGGER ERROR] Logger '{}' failed to write: {}", root.name, e);
                root.metrics.record_dropped();
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked: {}. Logging continues.",
                    root.sink.name(),
                    panic_message(panic_info.as_ref())
                );
                root.metrics.record_dropped();
            }
        }
    }

    fn flatten(&self, entry: &Record) -> Record {
        let mut record = self.node.root.identity.clone();
        record.merge(entry);
        for node in self.node.ancestors() {
            record.merge(&node.record);
        }
        record
    }

    pub fn should_write(&self, level: LogLevel, topic: &str, scope: &str) -> bool {
        self.node.root.sink.should_write(level, topic, scope)
    }

    pub fn set_filter_level(&self, level: LogLevel, topic: &str, scope: &str) {
        self.node.root.sink.set_filter_level(level, topic, scope);
    }

    /// Less verbose by one level
    pub fn filter_more(&self) {
        self.node.root.sink.filter_more();
    }

    /// More verbose by one level
    pub fn filter_less(&self) {
        self.node.root.sink.filter_less();
    }

    pub fn flush(&self) -> Result<()> {
        self.node.root.sink.flush()
    }

    pub fn close(&self) -> Result<()> {
        self.node.root.sink.close()
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// A logger is a valid sink, so one chain can feed another
impl Sink for Logger {
    fn name(&self) -> &str {
        Logger::name(self)
    }

    /// Merge the chain into `record`, apply every redaction rule from the
    /// root down, then hand the result to the root sink
    ///
    /// Lazy values are evaluated here, on the emitting thread.
    fn write(&self, record: &Record) -> Result<()> {
        let record = self.flatten(record);
        let chain: Vec<&Node> = self.node.ancestors().collect();
        let rules = chain.iter().rev().flat_map(|node| node.redactions.iter());

        self.node.root.sink.write(&redact_record(&record, rules))
    }

    fn levels(&self) -> Option<&LevelSet> {
        self.node.root.sink.levels()
    }

    fn should_write(&self, level: LogLevel, topic: &str, scope: &str) -> bool {
        Logger::should_write(self, level, topic, scope)
    }

    fn filter_level(&self, topic: &str, scope: &str) -> LogLevel {
        self.node.root.sink.filter_level(topic, scope)
    }

    fn set_filter_level(&self, level: LogLevel, topic: &str, scope: &str) {
        Logger::set_filter_level(self, level, topic, scope);
    }

    fn filter_more(&self) {
        Logger::filter_more(self);
    }

    fn filter_less(&self) {
        Logger::filter_less(self);
    }

    fn flush(&self) -> Result<()> {
        Logger::flush(self)
    }

    fn close(&self) -> Result<()> {
        Logger::close(self)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.node.root.name)
            .field("topic", &self.node.topic)
            .field("scope", &self.node.scope)
            .field("sink", &self.node.root.sink.name())
            .finish()
    }
}

/// Builder for root loggers
///
/// Without an explicit sink the logger writes to the destinations of its
/// [`LoggerConfig`] (standard output by default).
pub struct LoggerBuilder {
    name: String,
    sink: Option<Arc<dyn Sink>>,
    levels: Option<LevelSet>,
    record: Record,
    redactions: Vec<Redaction>,
    patterns: Vec<String>,
    converter: Option<ConverterKind>,
    config: Option<LoggerConfig>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink: None,
            levels: None,
            record: Record::new(),
            redactions: Vec::new(),
            patterns: Vec::new(),
            converter: None,
            config: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Use a sink that is also held elsewhere, e.g. to inspect it in tests
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Default filter level for every topic and scope
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.levels = Some(LevelSet::with_default(level));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn levels(mut self, levels: LevelSet) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Fields carried by the root node
    #[must_use = "builder methods return a new value"]
    pub fn record(mut self, record: Record) -> Self {
        self.record.merge(&record);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.record.set(key, value);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn redactor(mut self, rule: impl Into<Redaction>) -> Self {
        self.redactions.push(rule.into());
        self
    }

    /// Pattern compiled by [`build`](Self::build)
    #[must_use = "builder methods return a new value"]
    pub fn redact_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn redacted_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.redactions.push(KeyRedactor::new(keys).into());
        self
    }

    /// Output format of the default sink, ignored when a sink is given
    #[must_use = "builder methods return a new value"]
    pub fn converter(mut self, converter: ConverterKind) -> Self {
        self.converter = Some(converter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// # Errors
    ///
    /// [`LoggerError::InvalidPattern`](super::error::LoggerError::InvalidPattern)
    /// for a redaction pattern that does not compile, or the error of the
    /// configured destinations when they cannot be opened.
    pub fn build(self) -> Result<Logger> {
        let mut redactions = self.redactions;
        for pattern in &self.patterns {
            redactions.push(Redactor::new(pattern)?.into());
        }

        let sink = match self.sink {
            Some(sink) => {
                if let Some(levels) = &self.levels {
                    for (key, level) in levels.rules() {
                        sink.set_filter_level(level, key.topic(), key.scope());
                    }
                }
                sink
            }
            None => {
                let mut config = self.config.unwrap_or_default();
                if let Some(levels) = self.levels {
                    config.level = levels;
                }
                if let Some(converter) = self.converter {
                    config.converter = converter;
                }
                config.build_sink()?
            }
        };

        Ok(Logger::root(self.name, sink, self.record, redactions))
    }
}
