//! Configuration of a `LogLayer`
//!
//! `LogLayerConfig` is copied by value into child layers. Everything except
//! the error serializer can be loaded from JSON.

use super::error::{LogLayerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Error attached to a log call
pub type LoggedError = Box<dyn StdError + Send + Sync + 'static>;

/// Turns an error into the value stored under the error field
pub type ErrorSerializer = Arc<dyn Fn(&(dyn StdError + 'static)) -> Value + Send + Sync>;

pub const DEFAULT_ERROR_FIELD: &str = "err";

/// Serializer that records the error message and its `source()` chain
///
/// ```
/// use rust_log_layer::error_chain_serializer;
/// use serde_json::json;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let value = error_chain_serializer()(&err);
/// assert_eq!(value, json!({ "message": "disk full", "sources": [] }));
/// ```
pub fn error_chain_serializer() -> ErrorSerializer {
    Arc::new(|err: &(dyn StdError + 'static)| {
        let mut sources = Vec::new();
        let mut current = err.source();
        while let Some(source) = current {
            sources.push(Value::String(source.to_string()));
            current = source.source();
        }

        json!({
            "message": err.to_string(),
            "sources": sources,
        })
    })
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorConfig {
    pub field_name: String,
    pub copy_msg_on_only_error: bool,
    /// Without a serializer the error is stored as its `Display` string
    #[serde(skip)]
    pub serializer: Option<ErrorSerializer>,
}

impl ErrorConfig {
    pub fn serialize_error(&self, err: &(dyn StdError + 'static)) -> Value {
        match &self.serializer {
            Some(serializer) => serializer(err),
            None => Value::String(err.to_string()),
        }
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_ERROR_FIELD.to_string(),
            copy_msg_on_only_error: false,
            serializer: None,
        }
    }
}

impl fmt::Debug for ErrorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorConfig")
            .field("field_name", &self.field_name)
            .field("copy_msg_on_only_error", &self.copy_msg_on_only_error)
            .field("serializer", &self.serializer.is_some())
            .finish()
    }
}

/// Placement of context or metadata in the envelope.
///
/// Unset means the fields are flattened into the envelope; set means they
/// are nested under that key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    pub field_name: Option<String>,
}

impl FieldConfig {
    pub fn nested(field_name: impl Into<String>) -> Self {
        Self {
            field_name: Some(field_name.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogLayerConfig {
    pub enabled: bool,
    pub console_debug: bool,
    pub error: ErrorConfig,
    pub metadata: FieldConfig,
    pub context: FieldConfig,
    pub prefix: String,
    pub mute_context: bool,
    pub mute_metadata: bool,
}

impl Default for LogLayerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            console_debug: false,
            error: ErrorConfig::default(),
            metadata: FieldConfig::default(),
            context: FieldConfig::default(),
            prefix: String::new(),
            mute_context: false,
            mute_metadata: false,
        }
    }
}

impl LogLayerConfig {
    /// Parse a configuration document; missing keys take their defaults
    ///
    /// ```
    /// use rust_log_layer::LogLayerConfig;
    ///
    /// let config = LogLayerConfig::from_json(r#"{ "context": { "fieldName": "ctx" } }"#).unwrap();
    /// assert!(config.enabled);
    /// assert_eq!(config.context.field_name.as_deref(), Some("ctx"));
    /// assert_eq!(config.error.field_name, "err");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty field names, which would produce unaddressable envelope keys
    pub fn validate(&self) -> Result<()> {
        if self.error.field_name.is_empty() {
            return Err(LogLayerError::config("error", "field name must not be empty"));
        }
        if self.context.field_name.as_deref() == Some("") {
            return Err(LogLayerError::config("context", "field name must not be empty"));
        }
        if self.metadata.field_name.as_deref() == Some("") {
            return Err(LogLayerError::config("metadata", "field name must not be empty"));
        }
        Ok(())
    }
}

/// Options for `LogLayer::error_only`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorOnlyOpts {
    /// Level to log at; defaults to `Error`
    pub log_level: Option<LogLevel>,
    /// Force (`Some(true)`) or suppress (`Some(false)`) copying the error
    /// message into the message list
    pub copy_msg: Option<bool>,
}

impl ErrorOnlyOpts {
    pub fn level(log_level: LogLevel) -> Self {
        Self {
            log_level: Some(log_level),
            copy_msg: None,
        }
    }

    #[must_use]
    pub fn copy_msg(mut self, copy_msg: bool) -> Self {
        self.copy_msg = Some(copy_msg);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_defaults() {
        let config = LogLayerConfig::default();
        assert!(config.enabled);
        assert!(!config.console_debug);
        assert_eq!(config.error.field_name, "err");
        assert!(!config.error.copy_msg_on_only_error);
        assert!(config.prefix.is_empty());
        assert!(config.context.field_name.is_none());
    }

    #[test]
    fn test_from_json_reads_camel_case_keys() {
        let config = LogLayerConfig::from_json(
            r#"{
                "enabled": false,
                "consoleDebug": true,
                "error": { "fieldName": "error", "copyMsgOnOnlyError": true },
                "metadata": { "fieldName": "meta" },
                "prefix": "[svc]",
                "muteContext": true
            }"#,
        )
        .unwrap();

        assert!(!config.enabled);
        assert!(config.console_debug);
        assert_eq!(config.error.field_name, "error");
        assert!(config.error.copy_msg_on_only_error);
        assert_eq!(config.metadata, FieldConfig::nested("meta"));
        assert_eq!(config.prefix, "[svc]");
        assert!(config.mute_context);
        assert!(!config.mute_metadata);
    }

    #[test]
    fn test_from_json_rejects_empty_field_name() {
        let err = LogLayerConfig::from_json(r#"{ "error": { "fieldName": "" } }"#).unwrap_err();
        assert!(matches!(err, LogLayerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_default_serialization_uses_display() {
        let config = ErrorConfig::default();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(config.serialize_error(&err), json!("boom"));
    }

    #[test]
    fn test_error_chain_serializer_walks_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out"));
        let value = error_chain_serializer()(&err);
        assert_eq!(
            value,
            json!({ "message": "request failed", "sources": ["timed out"] })
        );
    }
}
