//! Stream handler for the asynchronous path
//!
//! Lines are written through a transport: a dedicated writer thread fed by a
//! bounded channel and holding its own handle to the sink. The transport is
//! created on first use. Concurrent first callers are serialised by the
//! initialisation lock; late arrivals reuse the transport instead of building
//! another one.

use super::write_error;
use crate::core::{Handler, HandlerKind, LogLevel, LogRecord, LoggerError, Result};
use crate::formatters::Formatter;
use crate::sinks::Sink;
use crossbeam_channel::{bounded, Sender};
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

enum Command {
    Write(String, Sender<io::Result<()>>),
    Flush(Sender<io::Result<()>>),
    Shutdown,
}

struct Transport {
    sender: Sender<Command>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Transport {
    fn spawn(name: &str, sink: Arc<dyn Sink>, capacity: usize) -> io::Result<Self> {
        let (sender, receiver) = bounded::<Command>(capacity);

        let worker = thread::Builder::new()
            .name(format!("janus-transport-{}", name))
            .spawn(move || {
                for command in receiver.iter() {
                    match command {
                        Command::Write(line, ack) => {
                            let _ = ack.send(sink.write_line(&line));
                        }
                        Command::Flush(ack) => {
                            let _ = ack.send(sink.flush());
                        }
                        Command::Shutdown => break,
                    }
                }
                let _ = sink.flush();
            })?;

        Ok(Self {
            sender,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Send a command and wait for the writer thread to acknowledge it
    fn round_trip(&self, make: impl FnOnce(Sender<io::Result<()>>) -> Command) -> io::Result<()> {
        let (ack, done) = bounded(1);
        let stopped = || io::Error::new(io::ErrorKind::BrokenPipe, "transport writer stopped");

        self.sender.send(make(ack)).map_err(|_| stopped())?;
        done.recv().map_err(|_| stopped())?
    }

    fn write(&self, line: String) -> io::Result<()> {
        self.round_trip(|ack| Command::Write(line, ack))
    }

    fn flush(&self) -> io::Result<()> {
        self.round_trip(Command::Flush)
    }

    fn shutdown(&self) -> Result<()> {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            worker
                .join()
                .map_err(|_| LoggerError::worker("transport writer thread panicked"))?;
        }
        Ok(())
    }
}

pub struct AsyncStreamHandler {
    name: String,
    sink: Arc<dyn Sink>,
    formatter: Arc<dyn Formatter>,
    min_level: RwLock<LogLevel>,
    capacity: usize,
    transport: Mutex<Option<Arc<Transport>>>,
    transport_inits: AtomicU64,
    closed: AtomicBool,
}

impl AsyncStreamHandler {
    /// Default transport queue capacity
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(name: impl Into<String>, sink: Arc<dyn Sink>, formatter: Arc<dyn Formatter>) -> Self {
        Self {
            name: name.into(),
            sink,
            formatter,
            min_level: RwLock::new(LogLevel::Trace),
            capacity: Self::DEFAULT_CAPACITY,
            transport: Mutex::new(None),
            transport_inits: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_min_level(self, level: LogLevel) -> Self {
        *self.min_level.write() = level;
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// How many times the transport has been initialised (0 or 1)
    pub fn transport_inits(&self) -> u64 {
        self.transport_inits.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn transport(&self) -> Result<Arc<Transport>> {
        let mut slot = self.transport.lock();
        if let Some(ref transport) = *slot {
            return Ok(Arc::clone(transport));
        }
        if self.is_closed() {
            return Err(LoggerError::closed(&self.name));
        }

        let transport = Transport::spawn(&self.name, Arc::clone(&self.sink), self.capacity)
            .map(Arc::new)
            .map_err(|e| {
                LoggerError::io_operation("starting transport", "cannot spawn writer thread", e)
            })?;
        self.transport_inits.fetch_add(1, Ordering::AcqRel);
        *slot = Some(Arc::clone(&transport));
        Ok(transport)
    }
}

impl Handler for AsyncStreamHandler {
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if record.level < *self.min_level.read() {
            return Ok(());
        }
        if self.is_closed() {
            return Err(LoggerError::closed(&record.name));
        }

        let line = self.formatter.format(record)?;
        self.transport()?
            .write(line)
            .map_err(|e| write_error(self.sink.as_ref(), e))
    }

    fn flush(&self) -> Result<()> {
        let transport = self.transport.lock().clone();
        match transport {
            Some(transport) => transport.flush()?,
            None => self.sink.flush()?,
        }
        Ok(())
    }

    // Stops the writer thread; the shared sink itself stays open.
    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let transport = self.transport.lock().take();
        if let Some(transport) = transport {
            transport.flush()?;
            transport.shutdown()?;
        }
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::AsyncStream
    }

    fn name(&self) -> &str {
        "async_stream"
    }
}
