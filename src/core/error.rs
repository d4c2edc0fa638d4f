//! Error types for the logging facade

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Facade or fixture could not be configured
    #[error("Invalid configuration for {component}: {message}")]
    Configuration { component: String, message: String },

    /// Serializer rejected a record
    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    /// Log call issued after shutdown
    #[error("Logger '{name}' is closed")]
    LoggerClosed { name: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Offload worker failed before the write completed
    #[error("Offload worker failed: {0}")]
    Worker(String),

    /// A handler panicked while processing a record
    #[error("Handler '{handler}' failed: {message}")]
    Handler { handler: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        LoggerError::Serialization {
            message: message.into(),
        }
    }

    /// Create a closed-logger error
    pub fn closed(name: impl Into<String>) -> Self {
        LoggerError::LoggerClosed { name: name.into() }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a worker error
    pub fn worker<S: Into<String>>(msg: S) -> Self {
        LoggerError::Worker(msg.into())
    }

    /// Create a handler failure error
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Handler {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LoggerError::LoggerClosed { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, LoggerError::Serialization { .. })
    }
}

impl From<serde_json::Error> for LoggerError {
    fn from(err: serde_json::Error) -> Self {
        LoggerError::serialization(err.to_string())
    }
}
