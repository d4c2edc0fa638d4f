//! Core logger types and traits

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handler;
pub mod log_context;
pub mod log_handle;
pub mod log_level;
pub mod log_record;
pub mod metrics;
pub mod named_logger;
pub mod registry;

pub use config::{FixtureOptions, JanusConfig, OutputFormat};
pub use error::{LoggerError, Result};
pub use handler::{Handler, HandlerKind};
pub use log_context::{Extra, FieldValue};
pub use log_handle::LogHandle;
pub use log_level::LogLevel;
pub use log_record::{render_message, CallSite, ErrorPayload, LogRecord};
pub use metrics::LoggerMetrics;
pub use named_logger::{LoggerPath, LoggerState, NamedLogger};
pub use registry::{HandlerSpec, ReconfigurePolicy, Registry};
