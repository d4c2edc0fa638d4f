//! Handler trait for record output destinations

use super::{error::Result, log_level::LogLevel, log_record::LogRecord};
use std::fmt;

/// Broad category of a handler
///
/// The registry uses it to recognise "the same kind of handler" when a logger
/// is requested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Writes inline on the calling thread
    Stream,
    /// Writes through a lazily initialised non-blocking transport
    AsyncStream,
    /// Discards every record
    Null,
    /// User-provided handler
    Custom,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandlerKind::Stream => "stream",
            HandlerKind::AsyncStream => "async_stream",
            HandlerKind::Null => "null",
            HandlerKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A formatter plus sink pair that turns records into output
///
/// Handlers are shared between threads; every method takes `&self`.
pub trait Handler: Send + Sync {
    /// Format and write `record` unless it is below the handler's level
    fn handle(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()>;

    /// Flush and release the handler's resources
    fn close(&self) -> Result<()>;

    fn min_level(&self) -> LogLevel;

    fn set_min_level(&self, level: LogLevel);

    fn kind(&self) -> HandlerKind;

    fn name(&self) -> &str;
}
