//! Plugin contract
//!
//! A `Plugin` is a bag of optional callbacks. Which callbacks are present is
//! what the registry indexes on, so a plugin only participates in the stages
//! it declares.

use super::log_context::Fields;
use super::log_level::LogLevel;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Stage of the pipeline a plugin callback hooks into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginCallbackType {
    OnBeforeDataOut,
    OnBeforeMessageOut,
    ShouldSendToLogger,
    OnMetadataCalled,
}

impl PluginCallbackType {
    pub const ALL: [PluginCallbackType; 4] = [
        PluginCallbackType::OnBeforeDataOut,
        PluginCallbackType::OnBeforeMessageOut,
        PluginCallbackType::ShouldSendToLogger,
        PluginCallbackType::OnMetadataCalled,
    ];
}

/// Input of `on_before_data_out`
#[derive(Debug, Clone, Copy)]
pub struct BeforeDataOutParams<'a> {
    pub log_level: LogLevel,
    /// Assembled envelope so far, `None` when there is nothing to send
    pub data: Option<&'a Fields>,
}

/// Input of `should_send_to_logger`
#[derive(Debug, Clone, Copy)]
pub struct ShouldSendParams<'a> {
    pub log_level: LogLevel,
    pub messages: &'a [Value],
    pub data: Option<&'a Fields>,
}

/// Input of `on_before_message_out`
#[derive(Debug, Clone, Copy)]
pub struct BeforeMessageOutParams<'a> {
    pub log_level: LogLevel,
    pub messages: &'a [Value],
}

/// Returns fields to merge into the envelope, or `None` to leave it unchanged
pub type BeforeDataOutFn = Arc<dyn Fn(BeforeDataOutParams<'_>) -> Option<Fields> + Send + Sync>;

/// Returns replacement messages, or `None` to leave them unchanged
pub type BeforeMessageOutFn =
    Arc<dyn Fn(BeforeMessageOutParams<'_>) -> Option<Vec<Value>> + Send + Sync>;

/// Returns `false` to veto the emission
pub type ShouldSendFn = Arc<dyn Fn(ShouldSendParams<'_>) -> bool + Send + Sync>;

/// Returns the metadata to log, or `None` to drop it
pub type MetadataCalledFn = Arc<dyn Fn(Fields) -> Option<Fields> + Send + Sync>;

/// Extension hooked into the log pipeline
///
/// Callback panics are not caught: a misbehaving plugin aborts the emission
/// it is running in.
///
/// # Example
///
/// ```
/// use rust_log_layer::Plugin;
///
/// let plugin = Plugin::new()
///     .with_id("hostname")
///     .on_before_data_out(|params| {
///         let mut extra = params.data.cloned().unwrap_or_default();
///         extra.insert("host".into(), "web-1".into());
///         Some(extra)
///     })
///     .should_send_to_logger(|params| params.messages.len() < 10);
///
/// assert_eq!(plugin.id(), Some("hostname"));
/// ```
#[derive(Clone, Default)]
pub struct Plugin {
    pub(crate) id: Option<String>,
    pub(crate) disabled: bool,
    pub(crate) on_before_data_out: Option<BeforeDataOutFn>,
    pub(crate) on_before_message_out: Option<BeforeMessageOutFn>,
    pub(crate) should_send_to_logger: Option<ShouldSendFn>,
    pub(crate) on_metadata_called: Option<MetadataCalledFn>,
}

impl Plugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit id; otherwise one is generated at registration
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Register the plugin in a disabled state
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn on_before_data_out<F>(mut self, callback: F) -> Self
    where
        F: Fn(BeforeDataOutParams<'_>) -> Option<Fields> + Send + Sync + 'static,
    {
        self.on_before_data_out = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_before_message_out<F>(mut self, callback: F) -> Self
    where
        F: Fn(BeforeMessageOutParams<'_>) -> Option<Vec<Value>> + Send + Sync + 'static,
    {
        self.on_before_message_out = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn should_send_to_logger<F>(mut self, callback: F) -> Self
    where
        F: Fn(ShouldSendParams<'_>) -> bool + Send + Sync + 'static,
    {
        self.should_send_to_logger = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_metadata_called<F>(mut self, callback: F) -> Self
    where
        F: Fn(Fields) -> Option<Fields> + Send + Sync + 'static,
    {
        self.on_metadata_called = Some(Arc::new(callback));
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether the plugin provides a callback for `kind`
    pub fn declares(&self, kind: PluginCallbackType) -> bool {
        match kind {
            PluginCallbackType::OnBeforeDataOut => self.on_before_data_out.is_some(),
            PluginCallbackType::OnBeforeMessageOut => self.on_before_message_out.is_some(),
            PluginCallbackType::ShouldSendToLogger => self.should_send_to_logger.is_some(),
            PluginCallbackType::OnMetadataCalled => self.on_metadata_called.is_some(),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let callbacks: Vec<_> = PluginCallbackType::ALL
            .into_iter()
            .filter(|kind| self.declares(*kind))
            .collect();

        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("disabled", &self.disabled)
            .field("callbacks", &callbacks)
            .finish()
    }
}
