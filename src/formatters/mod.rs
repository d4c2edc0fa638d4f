//! Record formatters and field serializers

pub mod json;
pub mod text;

pub use json::{JsonFormatter, JsonSerializer, INTERNAL_PREFIX, RESERVED_ATTRS};
pub use text::TextFormatter;

use crate::core::{FieldValue, LogRecord, Result};
use std::collections::BTreeMap;

/// Key/value mapping handed to a serializer
pub type RecordFields = BTreeMap<String, FieldValue>;

/// Turns a record into one output line
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> Result<String>;

    fn name(&self) -> &str;
}

/// Turns the formatter's field mapping into a string
///
/// Any `Fn(&RecordFields) -> Result<String>` closure is a serializer.
pub trait Serializer: Send + Sync {
    fn serialize(&self, fields: &RecordFields) -> Result<String>;
}

impl<F> Serializer for F
where
    F: Fn(&RecordFields) -> Result<String> + Send + Sync,
{
    fn serialize(&self, fields: &RecordFields) -> Result<String> {
        self(fields)
    }
}
