//! Blocking adapter: records are written on the caller's thread

use super::{describe, LoggerAdapter};
use crate::core::{Extra, LogRecord, NamedLogger, Result};
use std::fmt;
use std::sync::Arc;

/// Blocking view over a sync [`NamedLogger`]
///
/// Calls return once every handler has written the record, so calls made in
/// sequence on one thread are written in that order.
///
/// ```
/// use janus_logging::{Extra, LoggerAdapter, MemorySink, JanusLogger};
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::new());
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// let janus = JanusLogger::builder("billing")
///     .runtime(runtime.handle().clone())
///     .stream(sink.clone())
///     .build()
///     .unwrap();
///
/// let log = janus.logger_sync(Extra::new().with_field("request", "r-1"));
/// log.warning("retrying {} of {}", &[1.into(), 3.into()]).unwrap();
///
/// assert_eq!(sink.len(), 1);
/// assert!(janus.shutdown_blocking());
/// ```
#[derive(Clone)]
pub struct SyncAdapter {
    logger: Arc<NamedLogger>,
    extra: Extra,
}

impl SyncAdapter {
    pub fn new(logger: Arc<NamedLogger>, extra: Extra) -> Self {
        Self { logger, extra }
    }

    pub fn flush(&self) -> Result<()> {
        self.logger.flush()
    }
}

impl LoggerAdapter for SyncAdapter {
    type Output = Result<()>;

    fn logger(&self) -> &Arc<NamedLogger> {
        &self.logger
    }

    fn extra(&self) -> &Extra {
        &self.extra
    }

    fn dispatch(&self, record: LogRecord) -> Result<()> {
        self.logger.handle(&record)
    }

    fn resolved(&self, result: Result<()>) -> Result<()> {
        result
    }
}

impl fmt::Display for SyncAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe("SyncAdapter", &self.logger))
    }
}

impl fmt::Debug for SyncAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncAdapter")
            .field("logger", &self.logger.name())
            .field("extra", &self.extra)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, LogLevel, LoggerPath, Registry, HandlerSpec};
    use crate::formatters::JsonFormatter;
    use crate::sinks::MemorySink;

    fn adapter(level: LogLevel, extra: Extra) -> (SyncAdapter, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let registry = Registry::new();
        let logger = registry
            .get_or_create(
                LoggerPath::Sync,
                "orders",
                level,
                HandlerSpec::Stream {
                    sink: sink.clone(),
                    formatter: Arc::new(JsonFormatter::new()),
                },
            )
            .unwrap();
        (SyncAdapter::new(logger, extra), sink)
    }

    #[test]
    fn test_writes_inline_with_merged_extra() {
        let (log, sink) = adapter(LogLevel::Debug, Extra::new().with_field("bla", "blabla"));

        log.log_with_extra(
            LogLevel::Info,
            "order {} placed",
            &[FieldValue::from(7)],
            &Extra::new().with_field("bla", "override").with_field("user", "u-1"),
        )
        .unwrap();

        let line = &sink.json_lines()[0];
        assert_eq!(line["msg"], "order 7 placed");
        assert_eq!(line["bla"], "override");
        assert_eq!(line["user"], "u-1");
        assert_eq!(line["level"], "INFO");
    }

    #[test]
    fn test_disabled_level_writes_nothing() {
        let (log, sink) = adapter(LogLevel::Warning, Extra::new());
        log.debug("hidden", &[]).unwrap();
        log.info("hidden", &[]).unwrap();

        assert!(sink.is_empty());
        assert_eq!(log.logger().metrics().suppressed_count(), 2);
        assert_eq!(log.logger().state(), crate::core::LoggerState::Constructed);
    }

    #[test]
    fn test_call_site_is_caller() {
        let (log, sink) = adapter(LogLevel::Debug, Extra::new());
        let line = line!() + 1;
        log.error("boom", &[]).unwrap();

        let record = &sink.json_lines()[0];
        assert_eq!(record["line_numer"], line as i64);
        assert!(record["file_path"].as_str().unwrap().ends_with("sync_adapter.rs"));
    }

    #[test]
    fn test_exception_attaches_error() {
        let (log, sink) = adapter(LogLevel::Debug, Extra::new());
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
        log.exception("startup failed", &[], &err).unwrap();

        let record = &sink.json_lines()[0];
        assert_eq!(record["level"], "ERROR");
        assert_eq!(record["exc_info"], "config.toml missing");
    }

    #[test]
    fn test_serialization_error_is_returned() {
        let (log, sink) = adapter(LogLevel::Debug, Extra::new());
        let err = log
            .log_with_extra(
                LogLevel::Info,
                "ratio",
                &[],
                &Extra::new().with_field("ratio", f64::NAN),
            )
            .unwrap_err();

        assert!(err.is_serialization());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_closed_logger_rejects_calls() {
        let (log, _sink) = adapter(LogLevel::Debug, Extra::new());
        log.logger().close().unwrap();

        assert!(log.info("late", &[]).unwrap_err().is_closed());
        assert!(log.debug("late and quiet", &[]).unwrap_err().is_closed());
    }

    #[test]
    fn test_display_and_level_accessors() {
        let (log, _sink) = adapter(LogLevel::Info, Extra::new());
        assert_eq!(log.to_string(), "<SyncAdapter orders (INFO)>");

        log.set_level(LogLevel::Error);
        assert_eq!(log.effective_level(), LogLevel::Error);
        assert!(!log.is_enabled_for(LogLevel::Warning));
        assert!(log.has_handlers());
        assert_eq!(log.name(), "orders");
    }
}
