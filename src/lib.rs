//! # Janus Logging
//!
//! A logging facade with two call disciplines over one logical logger name:
//! a blocking path that writes on the caller's thread and a non-blocking path
//! that offloads writes to the runtime's blocking pool.
//!
//! ## Features
//!
//! - **Idempotent construction**: rebuilding a facade for a name reuses its
//!   loggers instead of attaching duplicate handlers
//! - **Structured output**: single-line JSON records with stable field names
//! - **Ordered shutdown**: async writes are drained before sync handlers close
//! - **Explicit registry**: no hidden global logger table

pub mod adapters;
pub mod core;
pub mod fixtures;
pub mod formatters;
pub mod handlers;
pub mod janus;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::adapters::{AsyncAdapter, LoggerAdapter, SyncAdapter};
    pub use crate::core::{
        Extra, FieldValue, JanusConfig, LogHandle, LogLevel, LoggerError, Result,
    };
    pub use crate::janus::{JanusLogger, JanusLoggerBuilder};
    pub use crate::sinks::{FileSink, MemorySink, Sink, StderrSink, StdoutSink};
}

pub use adapters::{AsyncAdapter, LoggerAdapter, SyncAdapter};
pub use crate::core::{
    diagnostics, render_message, CallSite, ErrorPayload, Extra, FieldValue, FixtureOptions,
    Handler, HandlerKind, HandlerSpec, JanusConfig, LogHandle, LogLevel, LogRecord, LoggerError,
    LoggerMetrics, LoggerPath, LoggerState, NamedLogger, OutputFormat, ReconfigurePolicy,
    Registry, Result,
};
pub use fixtures::{
    fixture_async_default, fixture_async_json, fixture_sync_default, fixture_sync_json,
    AsyncFixture, SyncFixture,
};
pub use formatters::{Formatter, JsonFormatter, JsonSerializer, RecordFields, Serializer, TextFormatter};
pub use handlers::{AsyncStreamHandler, NullHandler, StreamHandler};
pub use janus::{JanusLogger, JanusLoggerBuilder};
pub use sinks::{FileSink, MemorySink, Sink, StderrSink, StdoutSink};
