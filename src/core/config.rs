//! Construction options and serde-loadable facade configuration

use super::{
    error::{LoggerError, Result},
    log_context::Extra,
    log_level::LogLevel,
    registry::ReconfigurePolicy,
};
use crate::formatters::{Formatter, Serializer};
use crate::sinks::{Sink, StdoutSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Handler-relevant options passed to a fixture
///
/// Unset fields fall back to the fixture's defaults: stdout for `stream`,
/// JSON for `serializer`, and the fixture's own formatter.
#[derive(Clone)]
pub struct FixtureOptions {
    pub stream: Option<Arc<dyn Sink>>,
    pub serializer: Option<Arc<dyn Serializer>>,
    pub formatter: Option<Arc<dyn Formatter>>,
    /// Sync path only
    pub propagate: bool,
    /// Static fields the JSON formatter adds to every line
    pub extra: Extra,
    pub reconfigure_policy: ReconfigurePolicy,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            stream: None,
            serializer: None,
            formatter: None,
            propagate: true,
            extra: Extra::new(),
            reconfigure_policy: ReconfigurePolicy::default(),
        }
    }
}

impl FixtureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured stream, or a fresh stdout sink
    pub fn stream_or_stdout(&self) -> Arc<dyn Sink> {
        self.stream
            .clone()
            .unwrap_or_else(|| Arc::new(StdoutSink::new()))
    }
}

impl std::fmt::Debug for FixtureOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureOptions")
            .field("stream", &self.stream.as_ref().map(|s| s.name().to_string()))
            .field("serializer", &self.serializer.is_some())
            .field("formatter", &self.formatter.as_ref().map(|f| f.name().to_string()))
            .field("propagate", &self.propagate)
            .field("extra", &self.extra)
            .field("reconfigure_policy", &self.reconfigure_policy)
            .finish()
    }
}

/// Line format selected in a [`JanusConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Facade configuration loadable from JSON
///
/// ```
/// use janus_logging::{JanusConfig, LogLevel, OutputFormat};
///
/// let config = JanusConfig::from_json_str(
///     r#"{"name": "billing", "level": "DEBUG", "format": "json", "extra": {"region": "eu"}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.level, LogLevel::Debug);
/// assert_eq!(config.format, OutputFormat::Json);
/// assert!(config.propagate);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JanusConfig {
    pub name: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub extra: Extra,
    #[serde(default = "default_propagate")]
    pub propagate: bool,
    #[serde(default)]
    pub drain_timeout_ms: Option<u64>,
    #[serde(default)]
    pub strict_reconfigure: bool,
}

fn default_propagate() -> bool {
    true
}

impl JanusConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::default(),
            format: OutputFormat::default(),
            extra: Extra::new(),
            propagate: true,
            drain_timeout_ms: None,
            strict_reconfigure: false,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LoggerError::config("JanusConfig", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(LoggerError::config("JanusConfig", "name must not be empty"));
        }
        Ok(())
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_ms.map(Duration::from_millis)
    }

    pub fn reconfigure_policy(&self) -> ReconfigurePolicy {
        if self.strict_reconfigure {
            ReconfigurePolicy::Strict
        } else {
            ReconfigurePolicy::Lenient
        }
    }
}
