//! Handler implementations

pub mod async_stream;
pub mod null;
pub mod stream;

pub use async_stream::AsyncStreamHandler;
pub use null::NullHandler;
pub use stream::StreamHandler;

pub use crate::core::{Handler, HandlerKind};

use crate::core::LoggerError;
use crate::sinks::Sink;

pub(crate) fn write_error(sink: &dyn Sink, source: std::io::Error) -> LoggerError {
    LoggerError::io_operation(
        "writing record",
        format!("sink '{}' rejected the line", sink.name()),
        source,
    )
}
