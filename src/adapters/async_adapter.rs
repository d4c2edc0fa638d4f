//! Non-blocking adapter: writes are offloaded to the runtime's blocking pool

use super::{describe, LoggerAdapter};
use crate::core::{Extra, LogHandle, LogRecord, NamedLogger, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Non-blocking view over an async [`NamedLogger`]
///
/// A log call builds the record on the calling task, schedules the write on
/// [`Handle::spawn_blocking`] and returns a [`LogHandle`] right away. Writes are
/// scheduled in call order; with several blocking workers they may complete
/// in a different order.
#[derive(Clone)]
pub struct AsyncAdapter {
    logger: Arc<NamedLogger>,
    extra: Extra,
    runtime: Handle,
}

impl AsyncAdapter {
    pub fn new(logger: Arc<NamedLogger>, extra: Extra, runtime: Handle) -> Self {
        Self {
            logger,
            extra,
            runtime,
        }
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Drain in-flight writes, then flush and close the logger's handlers
    pub async fn shutdown(&self, drain_timeout: Option<Duration>) -> Result<()> {
        self.logger.shutdown(drain_timeout).await
    }
}

impl LoggerAdapter for AsyncAdapter {
    type Output = LogHandle;

    fn logger(&self) -> &Arc<NamedLogger> {
        &self.logger
    }

    fn extra(&self) -> &Extra {
        &self.extra
    }

    fn dispatch(&self, record: LogRecord) -> LogHandle {
        let pending = self.logger.track_write();
        // Shutdown may have started after admission; the drain only waits
        // for writes it can see.
        if let Err(e) = self.logger.ensure_open() {
            drop(pending);
            return LogHandle::failed(e);
        }
        let logger = Arc::clone(&self.logger);

        let join = self.runtime.spawn_blocking(move || {
            let _pending = pending;
            logger.handle(&record)
        });
        LogHandle::pending(join)
    }

    fn resolved(&self, result: Result<()>) -> LogHandle {
        match result {
            Ok(()) => LogHandle::completed(),
            Err(e) => LogHandle::failed(e),
        }
    }
}

impl fmt::Display for AsyncAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe("AsyncAdapter", &self.logger))
    }
}

impl fmt::Debug for AsyncAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAdapter")
            .field("logger", &self.logger.name())
            .field("extra", &self.extra)
            .finish()
    }
}
