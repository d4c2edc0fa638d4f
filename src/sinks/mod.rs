//! Line-oriented output sinks
//!
//! A sink accepts formatted lines, can be flushed and can be closed. Sinks are
//! shared (`Arc<dyn Sink>`) between the sync and async handlers of a facade.

pub mod console;
pub mod file;
pub mod memory;

pub use console::{StderrSink, StdoutSink};
pub use file::FileSink;
pub use memory::MemorySink;

use std::io;

pub trait Sink: Send + Sync {
    /// Write one line; the sink appends the line terminator
    fn write_line(&self, line: &str) -> io::Result<()>;

    fn flush(&self) -> io::Result<()>;

    /// Close the sink; later writes fail
    fn close(&self) -> io::Result<()>;

    fn name(&self) -> &str;
}

pub(crate) fn closed_error(sink: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("sink '{}' is closed", sink),
    )
}
