//! Integration tests for the dual-path facade
//!
//! These tests verify:
//! - Idempotent construction through a shared registry
//! - The extra merge rule
//! - The JSON wire format
//! - Disabled-level short circuit on the async path
//! - Shutdown ordering and behaviour after shutdown
//! - End-to-end output of both paths

use janus_logging::prelude::*;
use janus_logging::{
    critical, info, CallSite, FileSink, FixtureOptions, Handler, HandlerKind, HandlerSpec,
    JsonFormatter, LogRecord, LoggerPath, LoggerState, NamedLogger, ReconfigurePolicy, Registry,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::runtime::Handle;

fn json_janus(name: &str, sink: &Arc<MemorySink>, registry: &Arc<Registry>) -> JanusLogger {
    JanusLogger::builder(name)
        .level(LogLevel::Debug)
        .runtime(Handle::current())
        .registry(Arc::clone(registry))
        .stream(sink.clone())
        .json()
        .build()
        .expect("Failed to build facade")
}

/// Handler that records when it wrote and when it was closed
struct RecordingHandler {
    label: &'static str,
    write_delay: Duration,
    events: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl Handler for RecordingHandler {
    fn handle(&self, _record: &LogRecord) -> janus_logging::Result<()> {
        std::thread::sleep(self.write_delay);
        self.events
            .lock()
            .push((format!("{}-write", self.label), Instant::now()));
        Ok(())
    }

    fn flush(&self) -> janus_logging::Result<()> {
        Ok(())
    }

    fn close(&self) -> janus_logging::Result<()> {
        self.events
            .lock()
            .push((format!("{}-close", self.label), Instant::now()));
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Trace
    }

    fn set_min_level(&self, _level: LogLevel) {}

    fn kind(&self) -> HandlerKind {
        HandlerKind::Custom
    }

    fn name(&self) -> &str {
        self.label
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_repeated_construction_attaches_one_handler() {
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());

    let facades: Vec<_> = (0..3)
        .map(|_| json_janus("idempotent", &sink, &registry))
        .collect();

    for facade in &facades {
        assert_eq!(facade.sync_logger().handler_count(), 1);
        assert_eq!(facade.async_logger().handler_count(), 1);
        assert!(Arc::ptr_eq(facade.sync_logger(), facades[0].sync_logger()));
    }
    assert_eq!(registry.len(), 2);
    assert_eq!(facades[0].sync_logger().metrics().duplicates_prevented(), 2);

    facades[0]
        .logger_sync(Extra::new())
        .info("written once", &[])
        .expect("Failed to log");
    assert_eq!(sink.len(), 1);

    assert!(facades[0].shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconstruction_overwrites_level_only() {
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());
    let first = json_janus("relevel", &sink, &registry);

    let other_sink = Arc::new(MemorySink::new());
    let second = JanusLogger::builder("relevel")
        .level(LogLevel::Error)
        .runtime(Handle::current())
        .registry(Arc::clone(&registry))
        .stream(other_sink.clone())
        .build()
        .expect("Failed to build facade");

    assert_eq!(first.level(), LogLevel::Error);
    second
        .logger_sync(Extra::new())
        .error("still goes to the first sink", &[])
        .expect("Failed to log");

    assert_eq!(sink.len(), 1);
    assert!(other_sink.is_empty());
    assert!(second.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_strict_policy_rejects_different_handler() {
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());
    let first = json_janus("strict", &sink, &registry);

    let result = JanusLogger::builder("strict")
        .runtime(Handle::current())
        .registry(Arc::clone(&registry))
        .reconfigure_policy(ReconfigurePolicy::Strict)
        .sync_fixture(
            |registry: &Registry, name: &str, level: LogLevel, options: &FixtureOptions| {
                registry.get_or_create_with_policy(
                    LoggerPath::Sync,
                    name,
                    level,
                    HandlerSpec::Null,
                    options.reconfigure_policy,
                )
            },
        )
        .build();

    assert!(matches!(result, Err(LoggerError::Configuration { .. })));
    assert!(first.shutdown().await);
}

#[tokio::test]
async fn test_extra_merge_rule() {
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("merge")
        .level(LogLevel::Info)
        .runtime(Handle::current())
        .stream(sink.clone())
        .json()
        .extra(
            Extra::new()
                .with_field("bla", "blabla")
                .with_field("region", "eu"),
        )
        .build()
        .expect("Failed to build facade");

    let log = janus.logger_sync(
        Extra::new()
            .with_field("logger_name", "x")
            .with_field("region", "us"),
    );
    assert_eq!(log.extra().get("bla"), Some(&FieldValue::from("blabla")));
    assert_eq!(log.extra().get("logger_name"), Some(&FieldValue::from("x")));
    assert_eq!(log.extra().get("region"), Some(&FieldValue::from("us")));

    log.log_with_extra(
        LogLevel::Info,
        "merged",
        &[],
        &Extra::new().with_field("region", "ap"),
    )
    .expect("Failed to log");

    let line = &sink.json_lines()[0];
    assert_eq!(line["bla"], "blabla");
    assert_eq!(line["logger_name"], "x");
    assert_eq!(line["region"], "ap");
    assert!(janus.shutdown().await);
}

#[test]
fn test_json_wire_format() {
    let record = LogRecord::new("wire", LogLevel::Warning, "disk {} full")
        .with_args(vec![FieldValue::from("/var")])
        .with_call_site(CallSite::new("wire::check", "src/wire.rs", 12))
        .with_extra(
            Extra::new()
                .with_field("levelname", "spoofed")
                .with_field("lineno", 1)
                .with_field("threadName", "spoofed")
                .with_field("_internal", true)
                .with_field("tenant", "acme")
                .with_field("line_numer", "spoofed"),
        );

    let formatter = JsonFormatter::new().with_extra(Extra::new().with_field("service", "api"));
    let line = janus_logging::Formatter::format(&formatter, &record).expect("Failed to format");
    let value: serde_json::Value = serde_json::from_str(&line).expect("Invalid JSON");
    let object = value.as_object().expect("Expected an object");

    for reserved in ["levelname", "lineno", "threadName", "_internal"] {
        assert!(!object.contains_key(reserved), "{} leaked", reserved);
    }
    assert_eq!(object["tenant"], "acme");
    assert_eq!(object["service"], "api");

    assert!(object["logged_at"].is_string());
    assert_eq!(object["line_numer"], 12);
    assert_eq!(object["function"], "wire::check");
    assert_eq!(object["level"], "WARNING");
    assert_eq!(object["msg"], "disk /var full");
    assert_eq!(object["file_path"], "src/wire.rs");
    assert!(!line.contains('\n'));
}

#[tokio::test]
async fn test_disabled_async_call_resolves_immediately() {
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("quiet")
        .level(LogLevel::Error)
        .runtime(Handle::current())
        .stream(sink.clone())
        .build()
        .expect("Failed to build facade");

    let log = janus.logger_async(Extra::new());
    let handle = log.debug("suppressed", &[]);
    assert!(handle.is_finished());
    handle.await.expect("Suppressed call failed");

    assert_eq!(janus.async_logger().metrics().written_count(), 0);
    assert_eq!(janus.async_logger().metrics().suppressed_count(), 1);
    assert!(sink.is_empty());
    assert!(janus.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_drain_completes_before_sync_close() {
    let events = Arc::new(Mutex::new(Vec::new()));

    let sync_handler = Arc::new(RecordingHandler {
        label: "sync",
        write_delay: Duration::ZERO,
        events: Arc::clone(&events),
    });
    let async_handler = Arc::new(RecordingHandler {
        label: "async",
        write_delay: Duration::from_millis(30),
        events: Arc::clone(&events),
    });

    let janus = JanusLogger::builder("ordering")
        .level(LogLevel::Debug)
        .runtime(Handle::current())
        .sync_fixture(
            move |registry: &Registry, name: &str, level: LogLevel, _: &FixtureOptions| {
                registry.get_or_create(
                    LoggerPath::Sync,
                    name,
                    level,
                    HandlerSpec::Custom(sync_handler.clone()),
                )
            },
        )
        .async_fixture(
            move |registry: &Registry,
                  name: &str,
                  level: LogLevel,
                  _: &Handle,
                  _: &FixtureOptions| {
                registry.get_or_create(
                    LoggerPath::Async,
                    name,
                    level,
                    HandlerSpec::Custom(async_handler.clone()),
                )
            },
        )
        .build()
        .expect("Failed to build facade");

    let log = janus.logger_async(Extra::new());
    for i in 0..4 {
        // Not awaited: shutdown must drain them.
        drop(log.info("slow #{}", &[FieldValue::from(i)]));
    }
    assert!(janus.shutdown().await);

    let events = events.lock();
    let at = |label: &str| {
        events
            .iter()
            .filter(|(event, _)| event == label)
            .map(|(_, when)| *when)
            .collect::<Vec<_>>()
    };
    let async_writes = at("async-write");
    let async_close = at("async-close");
    let sync_close = at("sync-close");

    assert_eq!(async_writes.len(), 4);
    let last_write = async_writes.iter().max().copied().expect("no writes");
    assert!(last_write <= async_close[0]);
    assert!(async_close[0] <= sync_close[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_end_to_end_both_paths() {
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("demo")
        .level(LogLevel::Info)
        .runtime(Handle::current())
        .stream(sink.clone())
        .json()
        .extra(Extra::new().with_field("app", "demo"))
        .build()
        .expect("Failed to build facade");

    let sync_log = janus.logger_sync(Extra::new().with_field("log_type", "sync"));
    let writer = std::thread::spawn(move || -> janus_logging::Result<()> {
        for i in 0..4 {
            info!(sync_log, "s-Hello #{}", i)?;
        }
        info!(sync_log, "s-Finished #{}", 4)
    });

    let async_log = janus.logger_async(Extra::new().with_field("log_type", "async"));
    for i in 0..4 {
        info!(async_log, "aio-Hello #{}", i)
            .await
            .expect("Async write failed");
    }
    info!(async_log, "aio-Finished #{}", 4)
        .await
        .expect("Async write failed");

    writer
        .join()
        .expect("Writer thread panicked")
        .expect("Sync write failed");
    assert!(janus.shutdown().await);

    let lines = sink.json_lines();
    assert_eq!(lines.len(), 10);
    let count = |kind: &str| lines.iter().filter(|l| l["log_type"] == kind).count();
    assert_eq!(count("sync"), 5);
    assert_eq!(count("async"), 5);
    assert!(lines.iter().all(|l| l["app"] == "demo"));
    assert!(lines
        .iter()
        .any(|l| l["msg"] == "aio-Finished #4" && l["function"]
            .as_str()
            .is_some_and(|f| f.contains("test_end_to_end_both_paths"))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_calls_after_shutdown_are_rejected() {
    let sink = Arc::new(MemorySink::new());
    let janus = json_janus("closed", &sink, &Registry::new());
    let sync_log = janus.logger_sync(Extra::new());
    let async_log = janus.logger_async(Extra::new());

    assert!(janus.shutdown().await);
    assert_eq!(janus.sync_logger().state(), LoggerState::Closed);
    assert_eq!(janus.async_logger().state(), LoggerState::Closed);

    let err = sync_log.info("late", &[]).expect_err("Sync call succeeded");
    assert!(matches!(err, LoggerError::LoggerClosed { .. }));
    let err = async_log.info("late", &[]).await.expect_err("Async call succeeded");
    assert!(err.is_closed());

    assert!(janus.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconstruction_after_shutdown_builds_fresh_loggers() {
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());

    let first = json_janus("cycle", &sink, &registry);
    assert!(first.shutdown().await);
    assert!(registry.is_empty());

    let second = json_janus("cycle", &sink, &registry);
    assert!(!Arc::ptr_eq(first.sync_logger(), second.sync_logger()));
    assert_eq!(second.sync_logger().handler_count(), 1);

    second
        .logger_sync(Extra::new())
        .info("after restart", &[])
        .expect("Failed to log");
    assert_eq!(sink.len(), 1);
    assert!(second.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_serialization_error_surfaces_on_both_paths() {
    let sink = Arc::new(MemorySink::new());
    let janus = json_janus("nan", &sink, &Registry::new());
    let bad = Extra::new().with_field("ratio", f64::NAN);

    let err = janus
        .logger_sync(bad.clone())
        .info("sync", &[])
        .expect_err("NaN was serialized");
    assert!(err.is_serialization());

    let err = janus
        .logger_async(bad)
        .info("async", &[])
        .await
        .expect_err("NaN was serialized");
    assert!(err.is_serialization());

    assert!(sink.is_empty());
    assert!(janus.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_sink_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("janus.log");
    let file = Arc::new(FileSink::open(&log_file).expect("Failed to open log file"));

    let janus = JanusLogger::builder("file")
        .level(LogLevel::Info)
        .runtime(Handle::current())
        .stream(file.clone())
        .json()
        .build()
        .expect("Failed to build facade");

    janus
        .logger_sync(Extra::new())
        .warning("from sync", &[])
        .expect("Failed to log");
    janus
        .logger_async(Extra::new())
        .error("from async", &[])
        .await
        .expect("Failed to log");
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream timed out");
    janus
        .logger_sync(Extra::new())
        .exception("request failed", &[], &err)
        .expect("Failed to log");

    assert!(janus.shutdown().await);
    file.close().expect("Failed to close file");

    let content = std::fs::read_to_string(&log_file).expect("Failed to read log file");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).expect("Invalid JSON line"))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["exc_info"], "upstream timed out");
}

#[tokio::test]
async fn test_hierarchy_propagation_through_facades() {
    let registry = Registry::new();
    let parent_sink = Arc::new(MemorySink::new());
    let child_sink = Arc::new(MemorySink::new());

    let parent = json_janus("app", &parent_sink, &registry);
    let child = json_janus("app.db", &child_sink, &registry);

    critical!(child.logger_sync(Extra::new()), "pool exhausted").expect("Failed to log");
    assert_eq!(child_sink.len(), 1);
    assert_eq!(parent_sink.len(), 1);

    child
        .logger_async(Extra::new())
        .critical("async never propagates", &[])
        .await
        .expect("Failed to log");
    assert_eq!(child_sink.len(), 2);
    assert_eq!(parent_sink.len(), 1);

    assert!(child.shutdown().await);
    assert!(parent.shutdown().await);
}

#[test]
fn test_named_logger_is_shared_by_adapters() {
    let registry = Registry::new();
    let logger: Arc<NamedLogger> = registry
        .get_or_create(LoggerPath::Sync, "shared", LogLevel::Info, HandlerSpec::Null)
        .expect("Failed to create logger");

    let a = SyncAdapter::new(Arc::clone(&logger), Extra::new());
    let b = SyncAdapter::new(Arc::clone(&logger), Extra::new().with_field("k", 1));
    a.set_level(LogLevel::Error);

    assert_eq!(b.level(), LogLevel::Error);
    assert_eq!(Arc::strong_count(&logger), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reconstruction_keeps_propagation() {
    let registry = Registry::new();
    let parent_sink = Arc::new(MemorySink::new());
    let child_sink = Arc::new(MemorySink::new());
    let parent = json_janus("p", &parent_sink, &registry);
    let child = json_janus("p.child", &child_sink, &registry);

    let rebuilt = JanusLogger::builder("p.child")
        .level(LogLevel::Debug)
        .runtime(Handle::current())
        .registry(Arc::clone(&registry))
        .propagate(false)
        .build()
        .expect("Failed to build facade");

    assert!(rebuilt.sync_logger().propagate());
    child
        .logger_sync(Extra::new())
        .info("reaches the parent", &[])
        .expect("Failed to log");
    assert_eq!(child_sink.len(), 1);
    assert_eq!(parent_sink.len(), 1);

    assert!(child.shutdown().await);
    assert!(parent.shutdown().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_drain_is_reported_not_raised() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let slow = Arc::new(RecordingHandler {
        label: "slow",
        write_delay: Duration::from_millis(300),
        events: Arc::clone(&events),
    });

    let janus = JanusLogger::builder("stalled")
        .level(LogLevel::Debug)
        .runtime(Handle::current())
        .stream(Arc::new(MemorySink::new()))
        .drain_timeout(Duration::from_millis(30))
        .async_fixture(
            move |registry: &Registry,
                  name: &str,
                  level: LogLevel,
                  _: &Handle,
                  _: &FixtureOptions| {
                registry.get_or_create(
                    LoggerPath::Async,
                    name,
                    level,
                    HandlerSpec::Custom(slow.clone()),
                )
            },
        )
        .build()
        .expect("Failed to build facade");

    let log = janus.logger_async(Extra::new());
    for i in 0..2 {
        drop(log.info("stalled #{}", &[FieldValue::from(i)]));
    }

    let reported_before = janus_logging::diagnostics::reported_count();
    assert!(!janus.shutdown().await);

    assert!(janus_logging::diagnostics::reported_count() > reported_before);
    assert_eq!(janus.async_logger().state(), LoggerState::Closed);
    assert_eq!(janus.sync_logger().state(), LoggerState::Closed);
    assert!(janus.registry().is_empty());
    assert!(janus.shutdown().await);
}

#[test]
fn test_bounded_drain_on_runtime_without_timers() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .build()
        .expect("Failed to build runtime");
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("no-timers")
        .level(LogLevel::Info)
        .runtime(runtime.handle().clone())
        .stream(sink.clone())
        .json()
        .drain_timeout(Duration::from_millis(50))
        .build()
        .expect("Failed to build facade");

    let log = janus.logger_async(Extra::new());
    runtime
        .block_on(log.info("before shutdown", &[]))
        .expect("Failed to log");

    assert!(runtime.block_on(janus.shutdown()));
    assert_eq!(sink.len(), 1);
    assert_eq!(janus.async_logger().state(), LoggerState::Closed);
}
