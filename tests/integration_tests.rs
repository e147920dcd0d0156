//! Integration tests for chainlog
//!
//! These tests verify:
//! - Level filtering end to end, including topic/scope rules
//! - Field precedence along a logger chain
//! - Redaction before conversion
//! - File output as NDJSON
//! - Configuration driven loggers

use chainlog::core::record::{ERROR_FIELD, LEVEL_FIELD, MESSAGE_FIELD, NAME_FIELD, TIME_FIELD};
use chainlog::prelude::*;
use chainlog::core::REDACTED as REDACTED_MARKER;
use chainlog::{debug, info, warn, LoggerMetrics};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn memory_logger(levels: &str) -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new(LevelSet::parse(levels)));
    let logger = Logger::builder("integration")
        .shared_sink(sink.clone())
        .build()
        .expect("Failed to build logger");
    (logger, sink)
}

fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Every line is a JSON object"))
        .collect()
}

#[test]
fn test_warn_written_debug_filtered() {
    let (logger, sink) = memory_logger("INFO");

    warn!(logger, "disk at {}%", 91);
    debug!(logger, "disk at {}%", 91);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    let json = records[0].to_json();
    assert_eq!(json[LEVEL_FIELD], 40);
    assert_eq!(json[MESSAGE_FIELD], "disk at 91%");
    assert_eq!(json[NAME_FIELD], "integration");
    assert!(json[TIME_FIELD].as_str().unwrap().ends_with('Z'));
    assert_eq!(logger.metrics().filtered_count(), 1);
}

#[test]
fn test_topic_scope_rules() {
    let (logger, sink) = memory_logger("INFO;DEBUG:{auth:login}");

    assert!(logger.should_write(LogLevel::Debug, "auth", "login"));
    assert!(!logger.should_write(LogLevel::Debug, "auth", "logout"));
    assert!(!logger.should_write(LogLevel::Debug, "other", "x"));

    let auth = logger.with_topic("auth");
    auth.with_scope("login").debug("login debug");
    auth.with_scope("logout").debug("logout debug");
    auth.with_scope("logout").info("logout info");

    let messages: Vec<_> = sink
        .records()
        .iter()
        .filter_map(|r| r.get_str(MESSAGE_FIELD))
        .collect();
    assert_eq!(messages, vec!["login debug", "logout info"]);
}

#[test]
fn test_credit_card_redaction_chain() {
    let (root, sink) = memory_logger("INFO");
    let logger = root
        .with_redactor(Redactor::credit_card())
        .with_field("order", "1234 5678 9012 3456");

    logger.info("processing order");

    let record = &sink.records()[0];
    assert_eq!(record.get_str("order").as_deref(), Some(REDACTED_MARKER));
    assert_eq!(
        record.get_str(MESSAGE_FIELD).as_deref(),
        Some("processing order")
    );
}

#[test]
fn test_redaction_happens_before_conversion() {
    let sink = Arc::new(
        MemorySink::new(LevelSet::parse("INFO"))
            .with_converter(ConverterKind::StackDriver.converter()),
    );
    let logger = Logger::builder("gcp")
        .shared_sink(sink.clone())
        .redactor(Redactor::email())
        .redacted_keys(["msg_id"])
        .build()
        .unwrap();

    logger
        .with_field("msg_id", "42")
        .info("mail sent to jo@example.com");

    let json = sink.records()[0].to_json();
    assert_eq!(json["message"], "mail sent to REDACTED");
    assert_eq!(json["msg_id"], REDACTED_MARKER);
    assert_eq!(json["severity"], "INFO");
}

#[test]
fn test_child_fields_override_parent() {
    let (root, sink) = memory_logger("TRACE");
    let request = root
        .with_fields([("request_id", "r-1"), ("stage", "outer")])
        .with_child("http", "handler", [("stage", "inner")]);

    request.trace("handled");

    let json = sink.records()[0].to_json();
    assert_eq!(json["stage"], "inner");
    assert_eq!(json["request_id"], "r-1");
    assert_eq!(json["topic"], "http");
    assert_eq!(json["scope"], "handler");
}

#[test]
fn test_derivation_isolation() {
    let (root, sink) = memory_logger("INFO");
    let parent = root.with_field("a", "1");
    let child = parent.with_field("x", "y").with_redacted_keys(["a"]);

    parent.info("parent");
    child.info("child");

    let records = sink.records();
    assert_eq!(records[0].get_str("a").as_deref(), Some("1"));
    assert!(records[0].get("x").is_none());
    assert_eq!(records[1].get_str("a").as_deref(), Some(REDACTED_MARKER));
    assert_eq!(parent.fields().get_str("a").as_deref(), Some("1"));
}

#[derive(Debug)]
struct QueryError {
    source: std::io::Error,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "query failed")
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[test]
fn test_error_attachment_with_causes() {
    let (logger, sink) = memory_logger("INFO");
    let err = QueryError {
        source: std::io::Error::new(std::io::ErrorKind::TimedOut, "socket timeout"),
    };

    chainlog::error!(logger, err = err; "loading user {}", 7);

    let json = sink.records()[0].to_json();
    assert_eq!(json[MESSAGE_FIELD], "loading user 7: query failed");
    assert_eq!(json[ERROR_FIELD]["message"], "query failed");
    assert_eq!(json[ERROR_FIELD]["causes"][0], "socket timeout");
}

#[test]
fn test_file_sink_ndjson() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("app.log");

    let sink = FileSink::new(&log_file)
        .expect("Failed to create file sink")
        .with_level(LogLevel::Debug)
        .with_converter(ConverterKind::CloudWatch.converter());
    let logger = Logger::builder("file-test").sink(sink).build().unwrap();

    logger.debug("line\nbreak");
    logger.trace("filtered");
    logger.error("second");
    logger.close().expect("Failed to close");

    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][MESSAGE_FIELD], "line\nbreak");
    assert_eq!(lines[0][LEVEL_FIELD], "DEBUG");
    assert!(lines[0][TIME_FIELD].is_i64());
    assert_eq!(lines[1][LEVEL_FIELD], "ERROR");
}

#[test]
fn test_multi_sink_per_sink_levels() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("debug.log");
    let memory = Arc::new(MemorySink::new(LevelSet::parse("WARN")));

    let multi = MultiSink::new(vec![
        Arc::new(FileSink::new(&log_file).unwrap().with_level(LogLevel::Debug)) as Arc<dyn Sink>,
        memory.clone(),
    ]);
    let logger = Logger::builder("fanout").sink(multi).build().unwrap();

    assert!(logger.should_write(LogLevel::Debug, "main", "main"));
    logger.debug("only in file");
    logger.warn("everywhere");
    logger.flush().unwrap();

    assert_eq!(read_lines(&log_file).len(), 2);
    assert_eq!(memory.len(), 1);
}

#[test]
fn test_logger_from_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("configured.log");
    let path = log_file.to_str().unwrap().to_string();

    let config = LoggerConfig::from_lookup(|key| match key {
        "LOG_LEVEL" => Some("ERROR;INFO:{jobs}".to_string()),
        "LOG_DESTINATION" => Some(path.clone()),
        "LOG_CONVERTER" => Some("stackdriver".to_string()),
        "LOG_FLUSHFREQUENCY" => Some("10ms".to_string()),
        _ => None,
    })
    .unwrap();

    let logger = Logger::from_config("worker", &config).unwrap();
    logger.info("dropped");
    logger.with_topic("jobs").info("job started");

    std::thread::sleep(Duration::from_millis(100));
    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["message"], "job started");
    assert_eq!(lines[0]["severity"], "INFO");
    logger.close().unwrap();
}

#[test]
fn test_request_context() {
    let (logger, sink) = memory_logger("INFO");
    let context = RequestContext::new().with_logger(logger.with_field("path", "/health"));

    info!(context.logger().unwrap(), "ok");
    assert!(matches!(
        RequestContext::new().logger(),
        Err(LoggerError::MissingContext)
    ));
    assert_eq!(sink.records()[0].get_str("path").as_deref(), Some("/health"));
}

#[test]
fn test_metrics_shared_by_chain() {
    let (logger, _sink) = memory_logger("INFO");
    let child = logger.with_field("k", "v");

    child.info("a");
    logger.info("b");
    child.debug("c");

    let snapshot: LoggerMetrics = logger.metrics().clone();
    assert_eq!(snapshot.total_logged(), 2);
    assert_eq!(child.metrics().filtered_count(), 1);
}

#[test]
fn test_lazy_values_evaluated_per_record() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let (logger, sink) = memory_logger("INFO");
    let counter = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&counter);
    let logger = logger.with_field(
        "seq",
        Value::lazy(move || Value::from(calls.fetch_add(1, Ordering::SeqCst))),
    );
    let logger = logger.with_redactor(Redactor::phone());

    logger.info("one");
    logger.info("two");

    let seqs: Vec<_> = sink
        .records()
        .iter()
        .map(|r| r.to_json()["seq"].as_u64().unwrap())
        .collect();
    assert_eq!(seqs, vec![0, 1]);
}
