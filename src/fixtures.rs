//! Pluggable construction strategies for the two named loggers
//!
//! A fixture turns a name, a level and [`FixtureOptions`] into a
//! [`NamedLogger`], always through the [`Registry`] so that repeated
//! construction stays idempotent. Any closure with the right signature is a
//! fixture:
//!
//! ```
//! use janus_logging::{FixtureOptions, HandlerSpec, LogLevel, LoggerPath, Registry, SyncFixture};
//!
//! let quiet = |registry: &Registry, name: &str, level: LogLevel, _: &FixtureOptions| {
//!     registry.get_or_create(LoggerPath::Sync, name, level, HandlerSpec::Null)
//! };
//!
//! let registry = Registry::new();
//! let logger = quiet.build(&registry, "jobs", LogLevel::Info, &FixtureOptions::new()).unwrap();
//! assert_eq!(logger.handler_count(), 1);
//! ```

use crate::core::{
    FixtureOptions, HandlerSpec, LogLevel, LoggerPath, NamedLogger, Registry, Result,
};
use crate::formatters::{Formatter, JsonFormatter, TextFormatter};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Builds the sync-path logger
pub trait SyncFixture: Send + Sync {
    fn build(
        &self,
        registry: &Registry,
        name: &str,
        level: LogLevel,
        options: &FixtureOptions,
    ) -> Result<Arc<NamedLogger>>;
}

impl<F> SyncFixture for F
where
    F: Fn(&Registry, &str, LogLevel, &FixtureOptions) -> Result<Arc<NamedLogger>> + Send + Sync,
{
    fn build(
        &self,
        registry: &Registry,
        name: &str,
        level: LogLevel,
        options: &FixtureOptions,
    ) -> Result<Arc<NamedLogger>> {
        self(registry, name, level, options)
    }
}

/// Builds the async-path logger; receives the runtime it will be used on
pub trait AsyncFixture: Send + Sync {
    fn build(
        &self,
        registry: &Registry,
        name: &str,
        level: LogLevel,
        runtime: &Handle,
        options: &FixtureOptions,
    ) -> Result<Arc<NamedLogger>>;
}

impl<F> AsyncFixture for F
where
    F: Fn(&Registry, &str, LogLevel, &Handle, &FixtureOptions) -> Result<Arc<NamedLogger>>
        + Send
        + Sync,
{
    fn build(
        &self,
        registry: &Registry,
        name: &str,
        level: LogLevel,
        runtime: &Handle,
        options: &FixtureOptions,
    ) -> Result<Arc<NamedLogger>> {
        self(registry, name, level, runtime, options)
    }
}

fn text_formatter(options: &FixtureOptions) -> Arc<dyn Formatter> {
    options
        .formatter
        .clone()
        .unwrap_or_else(|| Arc::new(TextFormatter::new()))
}

fn json_formatter(options: &FixtureOptions) -> Arc<dyn Formatter> {
    if let Some(ref formatter) = options.formatter {
        return Arc::clone(formatter);
    }
    let mut formatter = JsonFormatter::new().with_extra(options.extra.clone());
    if let Some(ref serializer) = options.serializer {
        formatter = formatter.with_serializer(Arc::clone(serializer));
    }
    Arc::new(formatter)
}

fn build_sync(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    options: &FixtureOptions,
    formatter: Arc<dyn Formatter>,
) -> Result<Arc<NamedLogger>> {
    let spec = HandlerSpec::Stream {
        sink: options.stream_or_stdout(),
        formatter,
    };
    let propagate = options.propagate;
    registry.get_or_create_with(
        LoggerPath::Sync,
        name,
        level,
        spec,
        options.reconfigure_policy,
        |logger| logger.set_propagate(propagate),
    )
}

fn build_async(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    options: &FixtureOptions,
    formatter: Arc<dyn Formatter>,
) -> Result<Arc<NamedLogger>> {
    let spec = HandlerSpec::AsyncStream {
        sink: options.stream_or_stdout(),
        formatter,
    };
    registry.get_or_create_with_policy(
        LoggerPath::Async,
        name,
        level,
        spec,
        options.reconfigure_policy,
    )
}

/// Stream handler with the text formatter (or `options.formatter`)
pub fn fixture_sync_default(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    options: &FixtureOptions,
) -> Result<Arc<NamedLogger>> {
    build_sync(registry, name, level, options, text_formatter(options))
}

/// Stream handler with the JSON formatter
///
/// `options.extra` becomes the formatter's static extra and
/// `options.serializer` replaces the default JSON encoding.
pub fn fixture_sync_json(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    options: &FixtureOptions,
) -> Result<Arc<NamedLogger>> {
    build_sync(registry, name, level, options, json_formatter(options))
}

pub fn fixture_async_default(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    _runtime: &Handle,
    options: &FixtureOptions,
) -> Result<Arc<NamedLogger>> {
    build_async(registry, name, level, options, text_formatter(options))
}

pub fn fixture_async_json(
    registry: &Registry,
    name: &str,
    level: LogLevel,
    _runtime: &Handle,
    options: &FixtureOptions,
) -> Result<Arc<NamedLogger>> {
    build_async(registry, name, level, options, json_formatter(options))
}
