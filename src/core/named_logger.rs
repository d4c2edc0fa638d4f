//! Named logger: the unique, name-keyed logging target
//!
//! A `NamedLogger` holds a level threshold, its handlers and its lifecycle
//! state. Instances are created and owned by the [`Registry`](super::Registry);
//! adapters only borrow them through an `Arc`.

use super::{
    diagnostics,
    error::{LoggerError, Result},
    handler::Handler,
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::LoggerMetrics,
};
use parking_lot::{Condvar, Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Which namespace a logger belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggerPath {
    Sync,
    Async,
}

impl fmt::Display for LoggerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerPath::Sync => f.write_str("sync"),
            LoggerPath::Async => f.write_str("async"),
        }
    }
}

/// Lifecycle of a named logger
///
/// `Uninitialized -> Constructed -> Active -> ShuttingDown -> Closed`.
/// `Uninitialized` describes a name the registry has not built yet; a live
/// `NamedLogger` starts in `Constructed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoggerState {
    Uninitialized = 0,
    Constructed = 1,
    Active = 2,
    ShuttingDown = 3,
    Closed = 4,
}

impl LoggerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LoggerState::Constructed,
            2 => LoggerState::Active,
            3 => LoggerState::ShuttingDown,
            4 => LoggerState::Closed,
            _ => LoggerState::Uninitialized,
        }
    }
}

/// Counts offloaded writes that have been scheduled but not finished
#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    count: Mutex<usize>,
    idle: Condvar,
    notify: Notify,
}

impl PendingWrites {
    pub(crate) fn begin(self: &Arc<Self>) -> PendingGuard {
        *self.count.lock() += 1;
        PendingGuard {
            pending: Arc::clone(self),
        }
    }

    pub(crate) fn count(&self) -> usize {
        *self.count.lock()
    }

    fn finish(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
            self.notify.notify_waiters();
        }
    }

    async fn wait_idle(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Returns `false` if `timeout` expired with writes still in flight
    fn wait_idle_blocking(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut count = self.count.lock();
        while *count > 0 {
            match deadline {
                Some(deadline) => {
                    if self.idle.wait_until(&mut count, deadline).timed_out() {
                        return *count == 0;
                    }
                }
                None => self.idle.wait(&mut count),
            }
        }
        true
    }
}

/// Marks one offloaded write as finished when dropped
pub(crate) struct PendingGuard {
    pending: Arc<PendingWrites>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.finish();
    }
}

pub struct NamedLogger {
    name: String,
    path: LoggerPath,
    level: RwLock<LogLevel>,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    propagate: AtomicBool,
    parent: RwLock<Option<Arc<NamedLogger>>>,
    state: AtomicU8,
    pending: Arc<PendingWrites>,
    metrics: LoggerMetrics,
}

impl NamedLogger {
    pub(crate) fn new(name: impl Into<String>, path: LoggerPath, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            path,
            level: RwLock::new(level),
            handlers: RwLock::new(Vec::new()),
            propagate: AtomicBool::new(path == LoggerPath::Sync),
            parent: RwLock::new(None),
            state: AtomicU8::new(LoggerState::Constructed as u8),
            pending: Arc::new(PendingWrites::default()),
            metrics: LoggerMetrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> LoggerPath {
        self.path
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        level >= *self.level.read()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether this logger or a propagation ancestor has handlers
    pub fn has_handlers(&self) -> bool {
        if self.handler_count() > 0 {
            return true;
        }
        if !self.propagate() {
            return false;
        }
        self.parent().is_some_and(|parent| parent.has_handlers())
    }

    /// Snapshot of the attached handlers
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().clone()
    }

    pub(crate) fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.write().push(handler);
    }

    /// Propagation only applies to sync loggers
    pub fn propagate(&self) -> bool {
        self.path == LoggerPath::Sync && self.propagate.load(Ordering::Acquire)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.propagate.store(propagate, Ordering::Release);
    }

    pub fn parent(&self) -> Option<Arc<NamedLogger>> {
        self.parent.read().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<NamedLogger>>) {
        *self.parent.write() = parent;
    }

    pub fn state(&self) -> LoggerState {
        LoggerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.state() == LoggerState::Closed
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Number of offloaded writes not yet finished
    pub fn pending_writes(&self) -> usize {
        self.pending.count()
    }

    pub(crate) fn track_write(&self) -> PendingGuard {
        self.pending.begin()
    }

    /// Fails with `LoggerClosed` once shutdown has started
    pub fn ensure_open(&self) -> Result<()> {
        match self.state() {
            LoggerState::ShuttingDown | LoggerState::Closed => Err(LoggerError::closed(&self.name)),
            _ => Ok(()),
        }
    }

    /// Accept a new log call, moving `Constructed` to `Active`
    ///
    /// New calls are refused once shutdown has started.
    pub fn admit(&self) -> Result<()> {
        match self.state() {
            LoggerState::ShuttingDown | LoggerState::Closed => Err(LoggerError::closed(&self.name)),
            LoggerState::Constructed => {
                let _ = self.state.compare_exchange(
                    LoggerState::Constructed as u8,
                    LoggerState::Active as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Dispatch `record` to every handler, then to propagation ancestors
    ///
    /// Each handler is isolated: an error or panic in one does not keep the
    /// others from receiving the record. The first failure is returned.
    pub fn handle(&self, record: &LogRecord) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::closed(&self.name));
        }

        let mut first_error = self.call_handlers(record);

        let mut current = if self.propagate() { self.parent() } else { None };
        while let Some(ancestor) = current {
            if ancestor.is_closed() {
                break;
            }
            if let Some(e) = ancestor.call_handlers(record) {
                first_error.get_or_insert(e);
            }
            current = if ancestor.propagate() {
                ancestor.parent()
            } else {
                None
            };
        }

        match first_error {
            Some(e) => {
                self.metrics.record_failed();
                Err(e)
            }
            None => {
                self.metrics.record_written();
                Ok(())
            }
        }
    }

    fn call_handlers(&self, record: &LogRecord) -> Option<LoggerError> {
        let handlers = self.handlers();
        let mut first_error = None;

        for handler in handlers.iter() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler.handle(record)
            }));

            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => {
                    let panic_msg = diagnostics::panic_message(panic_info.as_ref());
                    diagnostics::critical(format!(
                        "Handler '{}' of logger '{}' panicked: {}. Other handlers continue to function.",
                        handler.name(),
                        self.name,
                        panic_msg
                    ));
                    LoggerError::handler(handler.name(), panic_msg)
                }
            };
            first_error.get_or_insert(error);
        }

        first_error
    }

    pub(crate) fn record_suppressed(&self) {
        self.metrics.record_suppressed();
    }

    pub fn flush(&self) -> Result<()> {
        for handler in self.handlers().iter() {
            handler.flush()?;
        }
        Ok(())
    }

    /// Move to `ShuttingDown`; `false` if shutdown already started
    pub(crate) fn begin_shutdown(&self) -> bool {
        loop {
            let current = self.state.load(Ordering::Acquire);
            match LoggerState::from_u8(current) {
                LoggerState::ShuttingDown | LoggerState::Closed => return false,
                _ => {
                    if self
                        .state
                        .compare_exchange(
                            current,
                            LoggerState::ShuttingDown as u8,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        return true;
                    }
                }
            }
        }
    }

    /// Flush and close every handler, then mark the logger `Closed`
    ///
    /// All handlers are closed even if one fails; the first error is returned.
    pub fn close(&self) -> Result<()> {
        self.begin_shutdown();
        let mut first_error = None;

        for handler in self.handlers().iter() {
            let result = handler.flush().and_then(|_| handler.close());
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        self.state
            .store(LoggerState::Closed as u8, Ordering::Release);
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Wait for in-flight offloaded writes, then close
    ///
    /// With `drain_timeout` set, a drain that does not finish in time is
    /// reported as an error after the handlers have been closed anyway.
    pub async fn shutdown(&self, drain_timeout: Option<Duration>) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.begin_shutdown();
        let drained = match drain_timeout {
            Some(timeout) => self.wait_idle_bounded(timeout).await,
            None => {
                self.pending.wait_idle().await;
                true
            }
        };
        self.finish_shutdown(drained)
    }

    // The bounded wait runs on the blocking pool so it needs no timer driver.
    // Outside a runtime the bound cannot be enforced and the drain is waited
    // out in full.
    async fn wait_idle_bounded(&self, timeout: Duration) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            diagnostics::warning(format!(
                "logger '{}': no runtime to bound the drain, waiting for all writes",
                self.name
            ));
            self.pending.wait_idle().await;
            return true;
        };

        let pending = Arc::clone(&self.pending);
        runtime
            .spawn_blocking(move || pending.wait_idle_blocking(Some(timeout)))
            .await
            .unwrap_or(false)
    }

    /// Blocking variant of [`shutdown`](Self::shutdown)
    ///
    /// Must not be called from a thread that drives the async runtime.
    pub fn shutdown_blocking(&self, drain_timeout: Option<Duration>) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.begin_shutdown();
        let drained = self.pending.wait_idle_blocking(drain_timeout);
        self.finish_shutdown(drained)
    }

    fn finish_shutdown(&self, drained: bool) -> Result<()> {
        let close_result = self.close();
        if !drained {
            return Err(LoggerError::worker(format!(
                "logger '{}' closed with {} writes still in flight",
                self.name,
                self.pending_writes()
            )));
        }
        close_result
    }
}

impl fmt::Display for NamedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<NamedLogger {} ({})>", self.name, self.level())
    }
}

impl fmt::Debug for NamedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedLogger")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .field("state", &self.state())
            .finish()
    }
}
