//! Last-resort diagnostic channel
//!
//! Failures that must not be raised (shutdown problems, handler panics on the
//! offload path) are written to stderr instead of being logged through the
//! loggers that just failed.

use std::sync::atomic::{AtomicU64, Ordering};

static REPORTED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    fn tag(self) -> &'static str {
        match self {
            Severity::Warning => "JANUS WARNING",
            Severity::Error => "JANUS ERROR",
            Severity::Critical => "JANUS CRITICAL",
        }
    }
}

/// Write one diagnostic line to stderr
pub fn report(severity: Severity, message: impl AsRef<str>) {
    REPORTED.fetch_add(1, Ordering::Relaxed);
    eprintln!("[{}] {}", severity.tag(), message.as_ref());
}

pub fn warning(message: impl AsRef<str>) {
    report(Severity::Warning, message);
}

pub fn error(message: impl AsRef<str>) {
    report(Severity::Error, message);
}

pub fn critical(message: impl AsRef<str>) {
    report(Severity::Critical, message);
}

/// Number of diagnostics reported by this process so far
pub fn reported_count() -> u64 {
    REPORTED.load(Ordering::Relaxed)
}

/// Extract a printable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
