//! Synchronous stream handler

use super::write_error;
use crate::core::{Handler, HandlerKind, LogLevel, LogRecord, LoggerError, Result};
use crate::formatters::Formatter;
use crate::sinks::Sink;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Formats and writes records inline, on the caller's thread
pub struct StreamHandler {
    sink: Arc<dyn Sink>,
    formatter: Arc<dyn Formatter>,
    min_level: RwLock<LogLevel>,
    close_sink: bool,
    closed: AtomicBool,
}

impl StreamHandler {
    pub fn new(sink: Arc<dyn Sink>, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            sink,
            formatter,
            min_level: RwLock::new(LogLevel::Trace),
            close_sink: false,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_min_level(self, level: LogLevel) -> Self {
        *self.min_level.write() = level;
        self
    }

    /// Close the sink too when the handler is closed
    ///
    /// Off by default: sinks such as stdout are shared by several handlers.
    #[must_use]
    pub fn closing_sink(mut self, close_sink: bool) -> Self {
        self.close_sink = close_sink;
        self
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Handler for StreamHandler {
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if record.level < *self.min_level.read() {
            return Ok(());
        }
        if self.is_closed() {
            return Err(LoggerError::closed(&record.name));
        }

        let line = self.formatter.format(record)?;
        self.sink
            .write_line(&line)
            .map_err(|e| write_error(self.sink.as_ref(), e))
    }

    fn flush(&self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.sink.flush()?;
        if self.close_sink {
            self.sink.close()?;
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Stream
    }

    fn name(&self) -> &str {
        "stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::{JsonFormatter, TextFormatter};
    use crate::sinks::MemorySink;

    fn handler(sink: &Arc<MemorySink>) -> StreamHandler {
        StreamHandler::new(sink.clone(), Arc::new(JsonFormatter::new()))
    }

    #[test]
    fn test_below_min_level_is_noop() {
        let sink = Arc::new(MemorySink::new());
        let handler = handler(&sink).with_min_level(LogLevel::Warning);

        handler
            .handle(&LogRecord::new("app", LogLevel::Info, "quiet"))
            .unwrap();
        handler
            .handle(&LogRecord::new("app", LogLevel::Error, "loud"))
            .unwrap();

        assert_eq!(sink.len(), 1);
        assert!(sink.lines()[0].contains("loud"));
    }

    #[test]
    fn test_sink_failure_is_returned() {
        let sink = Arc::new(MemorySink::new());
        sink.close().unwrap();
        let handler = handler(&sink);

        let err = handler
            .handle(&LogRecord::new("app", LogLevel::Info, "lost"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::IoOperation { .. }));
    }

    #[test]
    fn test_close_keeps_shared_sink_open() {
        let sink = Arc::new(MemorySink::new());
        let handler = StreamHandler::new(sink.clone(), Arc::new(TextFormatter::new()));

        handler.close().unwrap();
        assert!(!sink.is_closed());
        assert!(sink.flush_count() >= 1);

        let err = handler
            .handle(&LogRecord::new("app", LogLevel::Info, "late"))
            .unwrap_err();
        assert!(err.is_closed());
    }

    #[test]
    fn test_closing_sink_option() {
        let sink = Arc::new(MemorySink::new());
        let handler = handler(&sink).closing_sink(true);
        handler.close().unwrap();
        assert!(sink.is_closed());
    }
}
