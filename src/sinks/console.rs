//! Standard output and standard error sinks

use super::{closed_error, Sink};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Sink writing to the process's standard output
#[derive(Debug, Default)]
pub struct StdoutSink {
    closed: AtomicBool,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(closed_error(self.name()));
        }
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().flush()
    }

    // The process stream itself stays open; only this handle stops writing.
    fn close(&self) -> io::Result<()> {
        self.flush()?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

/// Sink writing to the process's standard error
#[derive(Debug, Default)]
pub struct StderrSink {
    closed: AtomicBool,
}

impl StderrSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(closed_error(self.name()));
        }
        let mut err = io::stderr().lock();
        err.write_all(line.as_bytes())?;
        err.write_all(b"\n")
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }

    fn close(&self) -> io::Result<()> {
        self.flush()?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn name(&self) -> &str {
        "stderr"
    }
}
