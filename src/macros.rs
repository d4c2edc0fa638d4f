//! Logging macros that record the enclosing function name.
//!
//! The adapter methods capture file and line through `#[track_caller]`, but
//! the function name is only known at compile time. These macros fill it in
//! and convert positional arguments into [`FieldValue`](crate::FieldValue)s.
//!
//! # Examples
//!
//! ```
//! use janus_logging::{info, warning, Extra, JanusLogger, LogLevel, MemorySink};
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let sink = Arc::new(MemorySink::new());
//! let janus = JanusLogger::builder("server")
//!     .level(LogLevel::Info)
//!     .runtime(runtime.handle().clone())
//!     .stream(sink.clone())
//!     .json()
//!     .build()
//!     .unwrap();
//! let log = janus.logger_sync(Extra::new());
//!
//! // Basic logging
//! info!(log, "Server started").unwrap();
//!
//! // Positional arguments
//! let port = 8080;
//! info!(log, "Server listening on port {}", port).unwrap();
//!
//! // Per-call extra fields
//! warning!(log, extra = Extra::new().with_field("attempt", 3), "Retrying {}", "upstream").unwrap();
//!
//! assert_eq!(sink.len(), 3);
//! assert!(janus.shutdown_blocking());
//! ```

/// Build a [`CallSite`](crate::CallSite) for the current location,
/// including the enclosing function's path.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(
            {
                fn __janus_here() {}
                fn __janus_type_name<T>(_: T) -> &'static str {
                    ::std::any::type_name::<T>()
                }
                let name = __janus_type_name(__janus_here);
                name.strip_suffix("::__janus_here").unwrap_or(name)
            },
            file!(),
            line!(),
        )
    };
}

/// Log at an explicit level through any [`LoggerAdapter`](crate::LoggerAdapter).
///
/// Returns the adapter's output: `Result<()>` for a
/// [`SyncAdapter`](crate::SyncAdapter), a [`LogHandle`](crate::LogHandle) for
/// an [`AsyncAdapter`](crate::AsyncAdapter).
///
/// # Examples
///
/// ```
/// # use janus_logging::*;
/// # let runtime = tokio::runtime::Runtime::new().unwrap();
/// # let janus = JanusLogger::builder("doc")
/// #     .runtime(runtime.handle().clone())
/// #     .stream(std::sync::Arc::new(MemorySink::new()))
/// #     .build()
/// #     .unwrap();
/// # let adapter = janus.logger_sync(Extra::new());
/// use janus_logging::log;
/// log!(adapter, LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($adapter:expr, $level:expr, extra = $extra:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::LoggerAdapter as _;
        ($adapter).log_at(
            $level,
            $template,
            &[$($crate::FieldValue::from($arg)),*],
            Some(&$extra),
            $crate::call_site!(),
            None,
        )
    }};
    ($adapter:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        use $crate::LoggerAdapter as _;
        ($adapter).log_at(
            $level,
            $template,
            &[$($crate::FieldValue::from($arg)),*],
            None,
            $crate::call_site!(),
            None,
        )
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($adapter:expr, $($arg:tt)+) => {
        $crate::log!($adapter, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($adapter:expr, $($arg:tt)+) => {
        $crate::log!($adapter, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($adapter:expr, $($arg:tt)+) => {
        $crate::log!($adapter, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($adapter:expr, $($arg:tt)+) => {
        $crate::log!($adapter, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($adapter:expr, $($arg:tt)+) => {
        $crate::log!($adapter, $crate::LogLevel::Critical, $($arg)+)
    };
}
