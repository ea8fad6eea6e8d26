//! Error types for the log layer

pub type Result<T> = std::result::Result<T, LogLayerError>;

#[derive(Debug, thiserror::Error)]
pub enum LogLayerError {
    /// A plugin was registered with an id that is already taken
    #[error("Plugin id '{id}' is already registered")]
    DuplicatePluginId { id: String },

    /// Failure reported by the wrapped logging backend
    #[error("Backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// The receiving side of a channel backend is gone
    #[error("Failed to forward log call: channel receiver disconnected")]
    ChannelSend,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LogLayerError {
    /// Create a duplicate plugin id error
    pub fn duplicate_plugin(id: impl Into<String>) -> Self {
        LogLayerError::DuplicatePluginId { id: id.into() }
    }

    /// Create a backend failure; used by backend implementations
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        LogLayerError::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LogLayerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LogLayerError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LogLayerError::duplicate_plugin("redactor");
        assert!(matches!(err, LogLayerError::DuplicatePluginId { .. }));

        let err = LogLayerError::config("context", "field name must not be empty");
        assert!(matches!(err, LogLayerError::InvalidConfiguration { .. }));

        let err = LogLayerError::backend("memory", "sink closed");
        assert!(matches!(err, LogLayerError::Backend { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LogLayerError::duplicate_plugin("redactor");
        assert_eq!(err.to_string(), "Plugin id 'redactor' is already registered");

        let err = LogLayerError::backend("winston", "transport closed");
        assert_eq!(err.to_string(), "Backend 'winston' failed: transport closed");

        let err = LogLayerError::config("metadata", "empty field name");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for metadata: empty field name"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: LogLayerError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
