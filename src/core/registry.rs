//! Idempotent name-to-logger registry
//!
//! The registry is an explicit object rather than a process global: a facade
//! is handed an `Arc<Registry>` and every construction for the same name goes
//! through the same critical section.

use super::{
    error::{LoggerError, Result},
    handler::{Handler, HandlerKind},
    log_level::LogLevel,
    named_logger::{LoggerPath, NamedLogger},
};
use crate::formatters::Formatter;
use crate::handlers::{AsyncStreamHandler, NullHandler, StreamHandler};
use crate::sinks::Sink;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What to attach to a logger the first time it is built
#[derive(Clone)]
pub enum HandlerSpec {
    /// Inline writer for the sync path
    Stream {
        sink: Arc<dyn Sink>,
        formatter: Arc<dyn Formatter>,
    },
    /// Transport-backed writer for the async path
    AsyncStream {
        sink: Arc<dyn Sink>,
        formatter: Arc<dyn Formatter>,
    },
    Null,
    Custom(Arc<dyn Handler>),
}

impl HandlerSpec {
    pub fn kind(&self) -> HandlerKind {
        match self {
            HandlerSpec::Stream { .. } => HandlerKind::Stream,
            HandlerSpec::AsyncStream { .. } => HandlerKind::AsyncStream,
            HandlerSpec::Null => HandlerKind::Null,
            HandlerSpec::Custom(handler) => handler.kind(),
        }
    }

    fn build(self, logger_name: &str) -> Arc<dyn Handler> {
        match self {
            HandlerSpec::Stream { sink, formatter } => Arc::new(StreamHandler::new(sink, formatter)),
            HandlerSpec::AsyncStream { sink, formatter } => {
                Arc::new(AsyncStreamHandler::new(logger_name, sink, formatter))
            }
            HandlerSpec::Null => Arc::new(NullHandler::new()),
            HandlerSpec::Custom(handler) => handler,
        }
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerSpec({})", self.kind())
    }
}

/// What to do when an existing logger is requested with a different handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconfigurePolicy {
    /// Overwrite the level, ignore the handler request
    #[default]
    Lenient,
    /// Overwrite the level, then fail if the handler kind differs
    Strict,
}

type LoggerKey = (LoggerPath, String);

/// Name-keyed store of [`NamedLogger`]s, one namespace per [`LoggerPath`]
///
/// # Example
///
/// ```
/// use janus_logging::{HandlerSpec, LogLevel, LoggerPath, Registry};
///
/// let registry = Registry::new();
/// let first = registry
///     .get_or_create(LoggerPath::Sync, "app", LogLevel::Info, HandlerSpec::Null)
///     .unwrap();
/// let second = registry
///     .get_or_create(LoggerPath::Sync, "app", LogLevel::Debug, HandlerSpec::Null)
///     .unwrap();
///
/// assert_eq!(second.handler_count(), 1);
/// assert_eq!(first.level(), LogLevel::Debug);
/// ```
#[derive(Default)]
pub struct Registry {
    loggers: Mutex<HashMap<LoggerKey, Arc<NamedLogger>>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Return the logger for `name`, building it on first request
    ///
    /// An existing logger only gets its level overwritten; no second handler
    /// is attached.
    pub fn get_or_create(
        &self,
        path: LoggerPath,
        name: &str,
        level: LogLevel,
        spec: HandlerSpec,
    ) -> Result<Arc<NamedLogger>> {
        self.get_or_create_with_policy(path, name, level, spec, ReconfigurePolicy::Lenient)
    }

    pub fn get_or_create_with_policy(
        &self,
        path: LoggerPath,
        name: &str,
        level: LogLevel,
        spec: HandlerSpec,
        policy: ReconfigurePolicy,
    ) -> Result<Arc<NamedLogger>> {
        self.get_or_create_with(path, name, level, spec, policy, |_| {})
    }

    /// Like [`get_or_create_with_policy`](Self::get_or_create_with_policy),
    /// running `on_create` on a newly built logger before it is registered
    ///
    /// `on_create` is not called for an existing logger, so settings applied
    /// there belong to the first construction only. A request rejected by
    /// the policy leaves the existing logger unchanged.
    pub fn get_or_create_with<F>(
        &self,
        path: LoggerPath,
        name: &str,
        level: LogLevel,
        spec: HandlerSpec,
        policy: ReconfigurePolicy,
        on_create: F,
    ) -> Result<Arc<NamedLogger>>
    where
        F: FnOnce(&NamedLogger),
    {
        if name.is_empty() {
            return Err(LoggerError::config("registry", "logger name must not be empty"));
        }

        let mut loggers = self.loggers.lock();

        if let Some(existing) = loggers.get(&(path, name.to_string())) {
            if policy == ReconfigurePolicy::Strict {
                let requested = spec.kind();
                let attached = existing.handlers().first().map(|h| h.kind());
                if let Some(attached) = attached.filter(|kind| *kind != requested) {
                    return Err(LoggerError::config(
                        "registry",
                        format!(
                            "{} logger '{}' already has a {} handler, refusing {}",
                            path, name, attached, requested
                        ),
                    ));
                }
            }

            existing.set_level(level);
            existing.metrics().record_duplicate_prevented();
            return Ok(Arc::clone(existing));
        }

        let logger = Arc::new(NamedLogger::new(name, path, level));
        logger.add_handler(spec.build(name));
        on_create(&logger);

        if path == LoggerPath::Sync {
            Self::link_hierarchy(&loggers, &logger);
        }
        loggers.insert((path, name.to_string()), Arc::clone(&logger));
        Ok(logger)
    }

    // Parent is the nearest existing dotted ancestor. Descendants whose
    // current parent is further away than `logger` are re-linked to it.
    fn link_hierarchy(loggers: &HashMap<LoggerKey, Arc<NamedLogger>>, logger: &Arc<NamedLogger>) {
        let name = logger.name();

        let parent = ancestors(name)
            .find_map(|ancestor| loggers.get(&(LoggerPath::Sync, ancestor.to_string())));
        logger.set_parent(parent.cloned());

        let prefix = format!("{}.", name);
        for ((path, other), candidate) in loggers.iter() {
            if *path != LoggerPath::Sync || !other.starts_with(&prefix) {
                continue;
            }
            let closer = candidate
                .parent()
                .map_or(true, |current| current.name().len() < name.len());
            if closer {
                candidate.set_parent(Some(Arc::clone(logger)));
            }
        }
    }

    /// Whether a logger named `name` exists on `path`
    pub fn contains(&self, path: LoggerPath, name: &str) -> bool {
        self.loggers.lock().contains_key(&(path, name.to_string()))
    }

    pub fn get(&self, path: LoggerPath, name: &str) -> Option<Arc<NamedLogger>> {
        self.loggers.lock().get(&(path, name.to_string())).cloned()
    }

    /// Forget a logger; children are re-linked to its parent
    ///
    /// The logger itself is not closed.
    pub fn remove(&self, path: LoggerPath, name: &str) -> Option<Arc<NamedLogger>> {
        let mut loggers = self.loggers.lock();
        let removed = loggers.remove(&(path, name.to_string()))?;
        Self::unlink_children(&loggers, &removed);
        Some(removed)
    }

    /// Forget `logger` only if it is still the registered instance
    pub fn unregister(&self, logger: &Arc<NamedLogger>) -> bool {
        let mut loggers = self.loggers.lock();
        let key = (logger.path(), logger.name().to_string());
        let registered = loggers
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, logger));
        if registered {
            loggers.remove(&key);
            Self::unlink_children(&loggers, logger);
        }
        registered
    }

    fn unlink_children(loggers: &HashMap<LoggerKey, Arc<NamedLogger>>, removed: &Arc<NamedLogger>) {
        for child in loggers.values() {
            if child.parent().is_some_and(|p| Arc::ptr_eq(&p, removed)) {
                child.set_parent(removed.parent());
            }
        }
    }

    /// Names registered on `path`, sorted
    pub fn names(&self, path: LoggerPath) -> Vec<String> {
        let mut names: Vec<String> = self
            .loggers
            .lock()
            .keys()
            .filter(|(p, _)| *p == path)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.lock().is_empty()
    }

    /// Close and forget every logger, async namespace first
    ///
    /// Every logger is closed even if one fails; the first error is returned.
    pub fn close_all(&self) -> Result<()> {
        let mut drained: Vec<Arc<NamedLogger>> =
            self.loggers.lock().drain().map(|(_, logger)| logger).collect();
        drained.sort_by_key(|logger| logger.path() == LoggerPath::Sync);

        let mut first_error = None;
        for logger in drained {
            if let Err(e) = logger.close() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("sync", &self.names(LoggerPath::Sync))
            .field("async", &self.names(LoggerPath::Async))
            .finish()
    }
}

/// Dotted ancestors of `name`, nearest first: `a.b.c` yields `a.b`, `a`
fn ancestors(name: &str) -> impl Iterator<Item = &str> {
    name.char_indices()
        .rev()
        .filter(|&(_, c)| c == '.')
        .map(move |(i, _)| &name[..i])
        .filter(|ancestor| !ancestor.is_empty())
}
