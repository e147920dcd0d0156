//! Sink trait for log output destinations
//!
//! A sink receives finalized (merged and redacted) records. Each sink owns the
//! [`LevelSet`] that decides what reaches it, so a fan-out can send debug
//! output to a file while keeping the console at INFO.

use super::{
    error::Result,
    level_set::LevelSet,
    log_level::LogLevel,
    record::{Record, LEVEL_FIELD, SCOPE_FIELD, TOPIC_FIELD},
    topic_scope::{ANY, DEFAULT_SCOPE, DEFAULT_TOPIC},
};

/// Output destination for log records
///
/// Sinks are shared between threads and must tolerate concurrent `write`
/// calls, typically by holding a mutex around their writer.
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, record: &Record) -> Result<()>;

    /// The filtering rules of this sink, if it has its own
    fn levels(&self) -> Option<&LevelSet> {
        None
    }

    fn should_write(&self, level: LogLevel, topic: &str, scope: &str) -> bool {
        level.should_write(self.filter_level(topic, scope))
    }

    fn filter_level(&self, topic: &str, scope: &str) -> LogLevel {
        self.levels()
            .map_or(LogLevel::Unset, |levels| levels.get(topic, scope))
    }

    fn set_filter_level(&self, level: LogLevel, topic: &str, scope: &str) {
        if let Some(levels) = self.levels() {
            levels.set(level, topic, scope);
        }
    }

    /// Raise the default filter one level (less output)
    ///
    /// Stops at FATAL; a silenced (NEVER) sink stays silent.
    fn filter_more(&self) {
        let level = self.filter_level(ANY, ANY);
        if (LogLevel::Unset..LogLevel::Fatal).contains(&level) {
            self.set_filter_level(level.next(), ANY, ANY);
        }
    }

    /// Lower the default filter one level (more output)
    ///
    /// Stops at TRACE, never stepping into UNSET or NEVER.
    fn filter_less(&self) {
        let level = self.filter_level(ANY, ANY);
        if level > LogLevel::Trace {
            self.set_filter_level(level.previous(), ANY, ANY);
        }
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.flush()
    }
}

/// Level, topic and scope of a finalized record, used to route it
///
/// Missing fields fall back to `Unset` and the default topic/scope.
pub fn routing_key(record: &Record) -> (LogLevel, String, String) {
    let level = record
        .get(LEVEL_FIELD)
        .and_then(|value| value.as_level())
        .unwrap_or(LogLevel::Unset);
    let topic = record
        .get_str(TOPIC_FIELD)
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    let scope = record
        .get_str(SCOPE_FIELD)
        .unwrap_or_else(|| DEFAULT_SCOPE.to_string());
    (level, topic, scope)
}
