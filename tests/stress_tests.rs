//! Stress tests for concurrent construction and logging
//!
//! These tests verify:
//! - Concurrent first-time construction attaches exactly one handler
//! - The async transport is initialised once under contention
//! - Shutdown drains a large number of unawaited writes
//! - Sync calls from many threads are all written

use janus_logging::prelude::*;
use janus_logging::{
    AsyncStreamHandler, Handler, HandlerSpec, JsonFormatter, LogRecord, LoggerPath, Registry,
};
use std::sync::{Arc, Barrier};
use std::thread;
use tokio::runtime::Handle;

#[test]
fn test_concurrent_get_or_create_attaches_one_handler() {
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());
    let barrier = Arc::new(Barrier::new(16));

    let workers: Vec<_> = (0..16)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let sink = sink.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let path = if i % 2 == 0 {
                    LoggerPath::Sync
                } else {
                    LoggerPath::Async
                };
                registry
                    .get_or_create(
                        path,
                        "contended",
                        LogLevel::Info,
                        HandlerSpec::Stream {
                            sink,
                            formatter: Arc::new(JsonFormatter::new()),
                        },
                    )
                    .expect("Failed to create logger")
            })
        })
        .collect();

    let loggers: Vec<_> = workers
        .into_iter()
        .map(|w| w.join().expect("Worker panicked"))
        .collect();

    assert_eq!(registry.len(), 2);
    for logger in &loggers {
        assert_eq!(logger.handler_count(), 1);
    }
    let sync_logger = registry
        .get(LoggerPath::Sync, "contended")
        .expect("Sync logger missing");
    assert_eq!(sync_logger.metrics().duplicates_prevented(), 7);
}

#[test]
fn test_concurrent_facade_construction() {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let registry = Registry::new();
    let sink = Arc::new(MemorySink::new());
    let barrier = Arc::new(Barrier::new(8));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let sink = sink.clone();
            let barrier = Arc::clone(&barrier);
            let handle = runtime.handle().clone();
            thread::spawn(move || {
                barrier.wait();
                JanusLogger::builder("facade")
                    .runtime(handle)
                    .registry(registry)
                    .stream(sink)
                    .json()
                    .build()
                    .expect("Failed to build facade")
            })
        })
        .collect();

    let facades: Vec<_> = workers
        .into_iter()
        .map(|w| w.join().expect("Worker panicked"))
        .collect();

    for facade in &facades {
        assert_eq!(facade.sync_logger().handler_count(), 1);
        assert_eq!(facade.async_logger().handler_count(), 1);
    }
    assert!(facades[0].shutdown_blocking());
}

#[test]
fn test_transport_initialised_once_under_contention() {
    let sink = Arc::new(MemorySink::new());
    let handler = Arc::new(AsyncStreamHandler::new(
        "contended",
        sink.clone(),
        Arc::new(JsonFormatter::new()),
    ));
    let barrier = Arc::new(Barrier::new(32));

    let workers: Vec<_> = (0..32)
        .map(|i| {
            let handler = Arc::clone(&handler);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for j in 0..10 {
                    handler
                        .handle(&LogRecord::new(
                            "contended",
                            LogLevel::Info,
                            format!("worker {} line {}", i, j),
                        ))
                        .expect("Write failed");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("Worker panicked");
    }

    assert_eq!(handler.transport_inits(), 1);
    handler.close().expect("Close failed");
    assert_eq!(sink.len(), 320);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_drains_high_volume() {
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("volume")
        .level(LogLevel::Debug)
        .runtime(Handle::current())
        .stream(sink.clone())
        .json()
        .build()
        .expect("Failed to build facade");

    let tasks: Vec<_> = (0..8)
        .map(|task| {
            let log = janus.logger_async(Extra::new().with_field("task", task));
            tokio::spawn(async move {
                for i in 0..100 {
                    drop(log.debug("entry {}", &[FieldValue::from(i)]));
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("Task panicked");
    }

    assert!(janus.shutdown().await);
    assert_eq!(sink.len(), 800);
    assert_eq!(janus.async_logger().pending_writes(), 0);
    assert_eq!(janus.async_logger().metrics().written_count(), 800);
}

#[test]
fn test_sync_logging_from_many_threads() {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to build runtime");
    let sink = Arc::new(MemorySink::new());
    let janus = JanusLogger::builder("threads")
        .level(LogLevel::Info)
        .runtime(runtime.handle().clone())
        .stream(sink.clone())
        .build()
        .expect("Failed to build facade");

    let workers: Vec<_> = (0..10)
        .map(|t| {
            let log = janus.logger_sync(Extra::new().with_field("thread", t));
            thread::spawn(move || {
                for i in 0..100 {
                    log.info("message {}", &[FieldValue::from(i)])
                        .expect("Write failed");
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("Worker panicked");
    }

    assert_eq!(sink.len(), 1000);
    assert!(janus.shutdown_blocking());
}
