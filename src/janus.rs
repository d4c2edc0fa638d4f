//! The facade: one name, a sync logger, an async logger and ordered shutdown

use crate::adapters::{AsyncAdapter, SyncAdapter};
use crate::core::{
    diagnostics, Extra, FixtureOptions, JanusConfig, LogLevel, LoggerError, LoggerPath,
    NamedLogger, OutputFormat, ReconfigurePolicy, Registry, Result,
};
use crate::fixtures::{
    fixture_async_default, fixture_async_json, fixture_sync_default, fixture_sync_json,
    AsyncFixture, SyncFixture,
};
use crate::formatters::{Formatter, Serializer};
use crate::sinks::Sink;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Logging facade with a blocking and a non-blocking path
///
/// Both paths share a name, a level and default extra fields but write
/// through two independent [`NamedLogger`]s. Construction goes through a
/// [`Registry`], so rebuilding a facade for the same name on the same registry
/// reuses the existing loggers instead of attaching more handlers.
///
/// ```
/// use janus_logging::{Extra, JanusLogger, LogLevel, LoggerAdapter, MemorySink};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let sink = Arc::new(MemorySink::new());
/// let janus = JanusLogger::builder("demo")
///     .level(LogLevel::Info)
///     .runtime(tokio::runtime::Handle::current())
///     .stream(sink.clone())
///     .json()
///     .extra(Extra::new().with_field("app", "demo"))
///     .build()
///     .unwrap();
///
/// janus.logger_sync(Extra::new()).info("from a thread", &[]).unwrap();
/// janus.logger_async(Extra::new()).info("from a task", &[]).await.unwrap();
///
/// assert!(janus.shutdown().await);
/// assert_eq!(sink.len(), 2);
/// # });
/// ```
pub struct JanusLogger {
    name: String,
    registry: Arc<Registry>,
    sync_logger: Arc<NamedLogger>,
    async_logger: Arc<NamedLogger>,
    extra: Extra,
    runtime: Handle,
    drain_timeout: Option<Duration>,
    shut_down: AtomicBool,
}

impl JanusLogger {
    /// Facade with the default text fixtures on a fresh registry
    pub fn new(name: impl Into<String>, level: LogLevel, runtime: Handle) -> Result<Self> {
        Self::builder(name).level(level).runtime(runtime).build()
    }

    pub fn builder(name: impl Into<String>) -> JanusLoggerBuilder {
        JanusLoggerBuilder::new(name)
    }

    /// Facade described by `config`, using the JSON or text fixtures
    pub fn from_config(config: &JanusConfig, runtime: Handle) -> Result<Self> {
        config.validate()?;
        let builder = Self::builder(config.name.clone())
            .level(config.level)
            .runtime(runtime)
            .extra(config.extra.clone())
            .propagate(config.propagate)
            .reconfigure_policy(config.reconfigure_policy());

        let builder = match config.drain_timeout() {
            Some(timeout) => builder.drain_timeout(timeout),
            None => builder,
        };
        match config.format {
            OutputFormat::Json => builder.json().build(),
            OutputFormat::Text => builder.build(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        self.sync_logger.level()
    }

    /// Set the threshold of both loggers
    pub fn set_level(&self, level: LogLevel) {
        self.sync_logger.set_level(level);
        self.async_logger.set_level(level);
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn sync_logger(&self) -> &Arc<NamedLogger> {
        &self.sync_logger
    }

    pub fn async_logger(&self) -> &Arc<NamedLogger> {
        &self.async_logger
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Blocking adapter; `extra` overrides the facade defaults
    pub fn logger_sync(&self, extra: Extra) -> SyncAdapter {
        SyncAdapter::new(Arc::clone(&self.sync_logger), self.extra.merged_with(&extra))
    }

    /// Non-blocking adapter; `extra` overrides the facade defaults
    pub fn logger_async(&self, extra: Extra) -> AsyncAdapter {
        AsyncAdapter::new(
            Arc::clone(&self.async_logger),
            self.extra.merged_with(&extra),
            self.runtime.clone(),
        )
    }

    /// Drain and close the async logger, then close the sync logger
    ///
    /// Failures are reported on the diagnostic channel and make the result
    /// `false`; they are never raised. Calling it again returns `true`.
    pub async fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return true;
        }
        let drained = self.async_logger.shutdown(self.drain_timeout).await;
        self.finish_shutdown(drained)
    }

    /// Blocking variant of [`shutdown`](Self::shutdown)
    ///
    /// Do not call this from a task on a current-thread runtime.
    pub fn shutdown_blocking(&self) -> bool {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return true;
        }
        let drained = self.async_logger.shutdown_blocking(self.drain_timeout);
        self.finish_shutdown(drained)
    }

    fn finish_shutdown(&self, drained: Result<()>) -> bool {
        let mut clean = report_failure(&self.async_logger, drained);
        clean &= report_failure(&self.sync_logger, self.sync_logger.close());

        self.registry.unregister(&self.async_logger);
        self.registry.unregister(&self.sync_logger);
        clean
    }
}

fn report_failure(logger: &NamedLogger, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            diagnostics::error(format!(
                "shutdown of {} logger '{}' failed: {}",
                logger.path(),
                logger.name(),
                e
            ));
            false
        }
    }
}

impl fmt::Debug for JanusLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JanusLogger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("extra", &self.extra)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Builder for [`JanusLogger`]
///
/// Defaults: level `WARNING`, the text fixtures, stdout, a fresh registry and
/// the runtime the builder is called from.
pub struct JanusLoggerBuilder {
    name: String,
    level: LogLevel,
    runtime: Option<Handle>,
    registry: Option<Arc<Registry>>,
    sync_fixture: Arc<dyn SyncFixture>,
    async_fixture: Arc<dyn AsyncFixture>,
    extra: Extra,
    options: FixtureOptions,
    drain_timeout: Option<Duration>,
}

impl JanusLoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::default(),
            runtime: None,
            registry: None,
            sync_fixture: Arc::new(fixture_sync_default),
            async_fixture: Arc::new(fixture_async_default),
            extra: Extra::new(),
            options: FixtureOptions::default(),
            drain_timeout: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Runtime whose blocking pool runs the async writes
    #[must_use = "builder methods return a new value"]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Share a registry with other facades
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sync_fixture<F: SyncFixture + 'static>(mut self, fixture: F) -> Self {
        self.sync_fixture = Arc::new(fixture);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn async_fixture<F: AsyncFixture + 'static>(mut self, fixture: F) -> Self {
        self.async_fixture = Arc::new(fixture);
        self
    }

    /// Use the JSON fixtures on both paths
    #[must_use = "builder methods return a new value"]
    pub fn json(self) -> Self {
        self.sync_fixture(fixture_sync_json)
            .async_fixture(fixture_async_json)
    }

    /// Default fields merged into every adapter
    #[must_use = "builder methods return a new value"]
    pub fn extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    /// Static fields of the JSON formatter
    #[must_use = "builder methods return a new value"]
    pub fn formatter_extra(mut self, extra: Extra) -> Self {
        self.options.extra = extra;
        self
    }

    /// Output sink shared by both paths
    #[must_use = "builder methods return a new value"]
    pub fn stream(mut self, stream: Arc<dyn Sink>) -> Self {
        self.options.stream = Some(stream);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.options.serializer = Some(serializer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.options.formatter = Some(formatter);
        self
    }

    /// Sync path only
    #[must_use = "builder methods return a new value"]
    pub fn propagate(mut self, propagate: bool) -> Self {
        self.options.propagate = propagate;
        self
    }

    /// Upper bound for draining in-flight async writes at shutdown
    #[must_use = "builder methods return a new value"]
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = Some(timeout);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn reconfigure_policy(mut self, policy: ReconfigurePolicy) -> Self {
        self.options.reconfigure_policy = policy;
        self
    }

    pub fn build(mut self) -> Result<JanusLogger> {
        if self.name.is_empty() {
            return Err(LoggerError::config("JanusLogger", "name must not be empty"));
        }
        let runtime = match self.runtime.take() {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| {
                LoggerError::config(
                    "JanusLogger",
                    "no concurrency context: pass a runtime handle or build inside a runtime",
                )
            })?,
        };
        let registry = self.registry.take().unwrap_or_else(Registry::new);

        let previous_level = registry
            .get(LoggerPath::Sync, &self.name)
            .map(|logger| logger.level());
        let built = self.build_loggers(&registry, &runtime);
        let (sync_logger, async_logger) = match built {
            Ok(loggers) => loggers,
            Err(e) => {
                rollback_sync(&registry, &self.name, previous_level);
                return Err(e);
            }
        };

        Ok(JanusLogger {
            name: self.name,
            registry,
            sync_logger,
            async_logger,
            extra: self.extra,
            runtime,
            drain_timeout: self.drain_timeout,
            shut_down: AtomicBool::new(false),
        })
    }
}

impl JanusLoggerBuilder {
    fn build_loggers(
        &self,
        registry: &Registry,
        runtime: &Handle,
    ) -> Result<(Arc<NamedLogger>, Arc<NamedLogger>)> {
        let sync_logger = self
            .sync_fixture
            .build(registry, &self.name, self.level, &self.options)?;
        check_fixture_output(&sync_logger, &self.name, LoggerPath::Sync)?;

        let async_logger =
            self.async_fixture
                .build(registry, &self.name, self.level, runtime, &self.options)?;
        check_fixture_output(&async_logger, &self.name, LoggerPath::Async)?;
        Ok((sync_logger, async_logger))
    }
}

// A failed build must not leave the sync side changed: restore the level of
// a logger that already existed, forget one this build created.
fn rollback_sync(registry: &Registry, name: &str, previous_level: Option<LogLevel>) {
    let Some(logger) = registry.get(LoggerPath::Sync, name) else {
        return;
    };
    match previous_level {
        Some(level) => logger.set_level(level),
        None => {
            registry.unregister(&logger);
        }
    }
}

fn check_fixture_output(logger: &NamedLogger, name: &str, path: LoggerPath) -> Result<()> {
    if logger.path() != path || logger.name() != name {
        return Err(LoggerError::config(
            "fixture",
            format!(
                "{} fixture for '{}' returned the {} logger '{}'",
                path,
                name,
                logger.path(),
                logger.name()
            ),
        ));
    }
    if logger.is_closed() {
        return Err(LoggerError::closed(logger.name()));
    }
    Ok(())
}
