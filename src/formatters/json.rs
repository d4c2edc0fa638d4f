//! JSON formatter for structured records
//!
//! Each record becomes a single-line JSON object built from, in order of
//! increasing precedence:
//! 1. the formatter's static extra,
//! 2. the record's extra, minus reserved and internal (`_`-prefixed) keys,
//! 3. the computed fields `logged_at`, `line_numer`, `function`, `level`,
//!    `msg` and `file_path` (plus `exc_info` when an error is attached).

use super::{Formatter, RecordFields, Serializer};
use crate::core::{Extra, FieldValue, LogRecord, Result};
use chrono::SecondsFormat;
use std::sync::Arc;

/// Record attribute names that are never copied from user extra
pub const RESERVED_ATTRS: &[&str] = &[
    "args",
    "asctime",
    "created",
    "exc_info",
    "exc_text",
    "filename",
    "funcName",
    "levelname",
    "levelno",
    "lineno",
    "module",
    "msecs",
    "message",
    "msg",
    "name",
    "pathname",
    "process",
    "processName",
    "relativeCreated",
    "stack_info",
    "thread",
    "threadName",
];

/// Keys starting with this prefix are internal and never emitted
pub const INTERNAL_PREFIX: &str = "_";

// `line_numer` is the established wire name; consumers depend on it.
const FIELD_LOGGED_AT: &str = "logged_at";
const FIELD_LINE_NUMBER: &str = "line_numer";
const FIELD_FUNCTION: &str = "function";
const FIELD_LEVEL: &str = "level";
const FIELD_MSG: &str = "msg";
const FIELD_FILE_PATH: &str = "file_path";
const FIELD_EXC_INFO: &str = "exc_info";

/// Strict single-line JSON encoding; non-finite floats are rejected
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, fields: &RecordFields) -> Result<String> {
        let mut object = serde_json::Map::with_capacity(fields.len());
        for (key, value) in fields {
            object.insert(key.clone(), value.to_json_value()?);
        }
        Ok(serde_json::to_string(&serde_json::Value::Object(object))?)
    }
}

pub struct JsonFormatter {
    extra: Extra,
    serializer: Arc<dyn Serializer>,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            extra: Extra::new(),
            serializer: Arc::new(JsonSerializer::new()),
        }
    }

    /// Static fields emitted with every record
    #[must_use]
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    /// Whether a record extra key may be copied into the output
    pub fn is_passthrough_key(key: &str) -> bool {
        !key.starts_with(INTERNAL_PREFIX) && !RESERVED_ATTRS.contains(&key)
    }

    /// Build the full key/value mapping for `record`
    pub fn fields(&self, record: &LogRecord) -> RecordFields {
        let mut fields: RecordFields = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in record.extra.iter() {
            if Self::is_passthrough_key(key) {
                fields.insert(key.clone(), value.clone());
            }
        }

        let computed = [
            (
                FIELD_LOGGED_AT,
                FieldValue::String(
                    record
                        .created
                        .to_rfc3339_opts(SecondsFormat::Micros, false),
                ),
            ),
            (
                FIELD_LINE_NUMBER,
                FieldValue::Int(i64::from(record.call_site.line)),
            ),
            (
                FIELD_FUNCTION,
                FieldValue::String(record.call_site.function.clone()),
            ),
            (
                FIELD_LEVEL,
                FieldValue::String(record.level.to_str().to_uppercase()),
            ),
            (FIELD_MSG, FieldValue::String(record.message())),
            (
                FIELD_FILE_PATH,
                FieldValue::String(record.call_site.file.clone()),
            ),
        ];
        for (key, value) in computed {
            fields.insert(key.to_string(), value);
        }

        if let Some(ref error) = record.error {
            fields.insert(
                FIELD_EXC_INFO.to_string(),
                FieldValue::String(error.render()),
            );
        }

        fields
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        self.serializer.serialize(&self.fields(record))
    }

    fn name(&self) -> &str {
        "json"
    }
}
