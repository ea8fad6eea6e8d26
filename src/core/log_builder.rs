//! Per-call builder for metadata and errors
//!
//! Started with `LogLayer::with_metadata` or `LogLayer::with_error` and
//! finished by one of the level methods, which consumes it.

use super::backend::LogBackend;
use super::config::LoggedError;
use super::error::Result;
use super::log_context::{merge_fields, Fields};
use super::log_entry::{IntoMessages, LogCall};
use super::log_layer::LogLayer;
use super::log_level::LogLevel;
use serde_json::Value;

/// Accumulates metadata and an error for a single log call
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
/// use rust_log_layer::fields;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Other);
///
/// log.with_metadata(fields! { "user_id" => 12345 })
///     .field("attempt", 3)
///     .with_error("connection reset")
///     .error("upload failed")
///     .unwrap();
///
/// let call = log.get_logger_instance().last_call().unwrap();
/// assert_eq!(
///     call.params[0],
///     json!({ "user_id": 12345, "attempt": 3, "err": "connection reset" })
/// );
/// ```
#[must_use = "a log builder does nothing until a level method is called"]
pub struct LogBuilder<'a, B: LogBackend + ?Sized = dyn LogBackend> {
    layer: &'a LogLayer<B>,
    metadata: Fields,
    has_metadata: bool,
    error: Option<LoggedError>,
}

impl<'a, B: LogBackend + ?Sized> LogBuilder<'a, B> {
    pub fn new(layer: &'a LogLayer<B>) -> Self {
        Self {
            layer,
            metadata: Fields::new(),
            has_metadata: false,
            error: None,
        }
    }

    /// Merge metadata into this call; later keys win
    pub fn with_metadata(mut self, metadata: Fields) -> Self {
        merge_fields(&mut self.metadata, metadata);
        self.has_metadata = true;
        self
    }

    /// Add a single metadata field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self.has_metadata = true;
        self
    }

    /// Attach an error, replacing any previous one
    pub fn with_error(mut self, error: impl Into<LoggedError>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Toggles logging on the owning layer, not just this call
    pub fn enable_logging(self) -> Self {
        self.layer.enable_logging();
        self
    }

    /// Toggles logging on the owning layer, not just this call
    pub fn disable_logging(self) -> Self {
        self.layer.disable_logging();
        self
    }

    pub fn log(self, level: LogLevel, messages: impl IntoMessages) -> Result<()> {
        let layer = self.layer;
        let mut messages = messages.into_messages();
        layer.format_message(&mut messages);

        let has_data =
            (self.has_metadata && !layer.is_metadata_muted()) || self.error.is_some();

        let data = has_data.then(|| {
            let mut data = self.metadata;
            if let Some(error) = &self.error {
                let error_config = layer.error_config();
                data.insert(
                    error_config.field_name.clone(),
                    error_config.serialize_error(&**error),
                );
            }
            data
        });

        layer.format_log(LogCall::new(level, messages).with_data(data))
    }

    pub fn info(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Info, messages)
    }

    pub fn warn(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Warn, messages)
    }

    pub fn error(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Error, messages)
    }

    pub fn debug(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Debug, messages)
    }

    pub fn trace(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Trace, messages)
    }

    pub fn fatal(self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Fatal, messages)
    }
}
