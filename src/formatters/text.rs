//! Human-readable text formatter

use super::Formatter;
use crate::core::{LogRecord, Result};
#[cfg(feature = "console")]
use colored::Colorize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// `[timestamp] [LEVEL] name - message key=value ...`
pub struct TextFormatter {
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn level_str(&self, record: &LogRecord) -> String {
        let level = format!("{:8}", record.level.to_str());
        #[cfg(feature = "console")]
        {
            if self.use_colors {
                return level.color(record.level.color_code()).to_string();
            }
        }
        level
    }
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape line breaks and tabs so one record stays on one line
fn sanitize(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

impl Formatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let mut output = format!(
            "[{}] [{}] {} - {}",
            record.created.format(TIMESTAMP_FORMAT),
            self.level_str(record),
            record.name,
            sanitize(&record.message())
        );

        if !record.extra.is_empty() {
            output.push(' ');
            output.push_str(&record.extra.format_fields());
        }

        if let Some(ref error) = record.error {
            output.push_str(" | ");
            output.push_str(&error.render());
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Extra, FieldValue, LogLevel};

    #[test]
    fn test_text_format() {
        let record = LogRecord::new("app", LogLevel::Warning, "disk at {}%")
            .with_args(vec![FieldValue::from(91)])
            .with_extra(Extra::new().with_field("mount", "/var"));

        let line = TextFormatter::new().format(&record).unwrap();
        assert!(line.contains("[WARNING ]"));
        assert!(line.contains("app - disk at 91%"));
        assert!(line.ends_with("mount=/var"));
    }

    #[test]
    fn test_line_injection_is_escaped() {
        let record = LogRecord::new(
            "app",
            LogLevel::Info,
            "User login\nERROR [2024-10-17] Fake error injected",
        );

        let line = TextFormatter::new().format(&record).unwrap();
        assert_eq!(line.lines().count(), 1);
        assert!(line.contains("User login\\nERROR"));
    }
}
