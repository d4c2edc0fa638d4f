//! Log record structure
//!
//! A `LogRecord` is built once per enabled log call, on the caller's thread,
//! and lives only until every handler has formatted it.

use super::log_context::{Extra, FieldValue};
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::panic::Location;

thread_local! {
    static THREAD_NAME_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Get cached thread name, computing and caching it on first access
fn current_thread_name() -> String {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                thread
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", thread.id()))
            })
            .clone()
    })
}

/// Source location of a log call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl CallSite {
    pub const UNKNOWN_FUNCTION: &'static str = "<unknown>";

    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }

    /// Capture the caller's file and line
    ///
    /// The function name is not available at runtime; the logging macros
    /// fill it in via [`call_site!`](crate::call_site).
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(Self::UNKNOWN_FUNCTION, location.file(), location.line())
    }
}

/// Error attached to a record by `exception(..)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    pub message: String,
    pub chain: Vec<String>,
}

impl ErrorPayload {
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            chain,
        }
    }

    /// Render as `message: cause: cause`
    pub fn render(&self) -> String {
        std::iter::once(self.message.as_str())
            .chain(self.chain.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(": ")
    }
}

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub name: String,
    pub level: LogLevel,
    pub template: String,
    pub args: Vec<FieldValue>,
    pub extra: Extra,
    pub created: DateTime<Local>,
    pub call_site: CallSite,
    pub error: Option<ErrorPayload>,
    pub thread_name: String,
}

impl LogRecord {
    pub fn new(name: impl Into<String>, level: LogLevel, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level,
            template: template.into(),
            args: Vec::new(),
            extra: Extra::new(),
            created: Local::now(),
            call_site: CallSite::new(CallSite::UNKNOWN_FUNCTION, "", 0),
            error: None,
            thread_name: current_thread_name(),
        }
    }

    pub fn with_args(mut self, args: Vec<FieldValue>) -> Self {
        self.args = args;
        self
    }

    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = call_site;
        self
    }

    pub fn with_error(mut self, error: ErrorPayload) -> Self {
        self.error = Some(error);
        self
    }

    /// Message with positional arguments substituted
    pub fn message(&self) -> String {
        render_message(&self.template, &self.args)
    }
}

/// Substitute each `{}` in `template` with the next argument
///
/// `{{` and `}}` produce literal braces. Placeholders without a matching
/// argument are kept verbatim; surplus arguments are ignored.
pub fn render_message(template: &str, args: &[FieldValue]) -> String {
    if args.is_empty() && !template.contains("{{") && !template.contains("}}") {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                match args.next() {
                    Some(arg) => out.push_str(&arg.to_string()),
                    None => out.push_str("{}"),
                }
            }
            _ => out.push(c),
        }
    }
    out
}
