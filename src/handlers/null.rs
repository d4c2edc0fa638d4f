//! Handler that discards every record

use crate::core::{Handler, HandlerKind, LogLevel, LogRecord, Result};
use parking_lot::RwLock;

#[derive(Debug)]
pub struct NullHandler {
    min_level: RwLock<LogLevel>,
}

impl NullHandler {
    pub fn new() -> Self {
        Self {
            min_level: RwLock::new(LogLevel::Trace),
        }
    }
}

impl Default for NullHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for NullHandler {
    fn handle(&self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Null
    }

    fn name(&self) -> &str {
        "null"
    }
}
