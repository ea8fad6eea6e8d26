//! The log layer: envelope assembly and dispatch

use super::{
    backend::{BackendKind, LogBackend},
    config::{ErrorConfig, ErrorOnlyOpts, LogLayerConfig, LoggedError},
    dispatch::{DispatchOutcome, DispatchTable, Dispatcher},
    error::Result,
    log_builder::LogBuilder,
    log_context::{merge_fields, Fields, LogContext},
    log_entry::{apply_prefix, IntoMessages, LogCall},
    log_level::LogLevel,
    metrics::LayerMetrics,
    plugin::{Plugin, PluginCallbackType},
    plugin_manager::PluginManager,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Facade over a logging backend
///
/// Holds persistent context, configuration and a shared plugin registry,
/// and turns every log call into a parameter list the wrapped backend
/// understands. All methods take `&self`; a `LogLayer` can be shared
/// between threads behind an `Arc`.
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
/// use rust_log_layer::fields;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Pino);
///
/// log.with_context(fields! { "request_id" => "abc-123" });
/// log.with_metadata(fields! { "latency_ms" => 42 })
///     .info("request handled")
///     .unwrap();
///
/// let call = log.get_logger_instance().last_call().unwrap();
/// assert_eq!(
///     call.params,
///     vec![json!({ "request_id": "abc-123", "latency_ms": 42 }), json!("request handled")]
/// );
/// ```
pub struct LogLayer<B: LogBackend + ?Sized = dyn LogBackend> {
    instance: Arc<B>,
    kind: BackendKind,
    dispatch_table: Arc<DispatchTable>,
    dispatcher: Dispatcher,
    config: LogLayerConfig,
    enabled: AtomicBool,
    mute_context: AtomicBool,
    mute_metadata: AtomicBool,
    context: RwLock<LogContext>,
    plugins: Arc<PluginManager>,
    metrics: LayerMetrics,
}

impl<B: LogBackend + ?Sized> LogLayer<B> {
    /// Wrap `instance` with the default configuration
    pub fn new(instance: Arc<B>, kind: BackendKind) -> Self {
        Self::from_parts(
            instance,
            kind,
            LogLayerConfig::default(),
            Arc::new(DispatchTable::default()),
            Arc::new(PluginManager::new()),
            LogContext::new(),
        )
    }

    /// Create a builder for a layer wrapping `instance`
    ///
    /// # Example
    /// ```
    /// use rust_log_layer::prelude::*;
    /// use std::sync::Arc;
    ///
    /// let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
    ///     .kind(BackendKind::Winston)
    ///     .metadata_field_name("meta")
    ///     .prefix("[api]")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(log.kind(), BackendKind::Winston);
    /// ```
    #[must_use]
    pub fn builder(instance: Arc<B>) -> LogLayerBuilder<B> {
        LogLayerBuilder::new(instance)
    }

    pub(crate) fn from_parts(
        instance: Arc<B>,
        kind: BackendKind,
        config: LogLayerConfig,
        dispatch_table: Arc<DispatchTable>,
        plugins: Arc<PluginManager>,
        context: LogContext,
    ) -> Self {
        let dispatcher = Dispatcher::new(dispatch_table.profile(kind), config.console_debug);
        Self {
            instance,
            kind,
            dispatch_table,
            dispatcher,
            enabled: AtomicBool::new(config.enabled),
            mute_context: AtomicBool::new(config.mute_context),
            mute_metadata: AtomicBool::new(config.mute_metadata),
            config,
            context: RwLock::new(context),
            plugins,
            metrics: LayerMetrics::new(),
        }
    }

    /// Current configuration, including the live enabled and mute switches
    pub fn config(&self) -> LogLayerConfig {
        LogLayerConfig {
            enabled: self.is_enabled(),
            mute_context: self.is_context_muted(),
            mute_metadata: self.is_metadata_muted(),
            ..self.config.clone()
        }
    }

    pub(crate) fn error_config(&self) -> &ErrorConfig {
        &self.config.error
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn metrics(&self) -> &LayerMetrics {
        &self.metrics
    }

    /// The wrapped backend
    pub fn get_logger_instance(&self) -> &Arc<B> {
        &self.instance
    }

    /// New layer with the same configuration and plugin registry and a
    /// copy of the current context.
    ///
    /// Context written to the child afterwards is not seen by the parent,
    /// and the other way around. Plugin changes are seen by both.
    pub fn child(&self) -> Self {
        Self::from_parts(
            Arc::clone(&self.instance),
            self.kind,
            self.config(),
            Arc::clone(&self.dispatch_table),
            Arc::clone(&self.plugins),
            self.context.read().clone(),
        )
    }

    /// `child()` with `prefix` prepended to the first message of every call
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        let mut child = self.child();
        child.config.prefix = prefix.into();
        child
    }

    /// Merge `context` into the persistent context of this layer
    pub fn with_context(&self, context: Fields) -> &Self {
        self.context.write().merge(context);
        self
    }

    /// Snapshot of the persistent context
    pub fn get_context(&self) -> Fields {
        self.context.read().fields().clone()
    }

    /// Start a call carrying metadata
    pub fn with_metadata(&self, metadata: Fields) -> LogBuilder<'_, B> {
        LogBuilder::new(self).with_metadata(metadata)
    }

    /// Start a call carrying an error
    pub fn with_error(&self, error: impl Into<LoggedError>) -> LogBuilder<'_, B> {
        LogBuilder::new(self).with_error(error)
    }

    /// Shared plugin registry
    pub fn plugins(&self) -> &Arc<PluginManager> {
        &self.plugins
    }

    pub fn add_plugins(&self, plugins: impl IntoIterator<Item = Plugin>) -> Result<()> {
        self.plugins.add_plugins(plugins)
    }

    pub fn enable_plugin(&self, id: &str) {
        self.plugins.enable_plugin(id);
    }

    pub fn disable_plugin(&self, id: &str) {
        self.plugins.disable_plugin(id);
    }

    pub fn remove_plugin(&self, id: &str) {
        self.plugins.remove_plugin(id);
    }

    /// Drop every call until `enable_logging`
    pub fn disable_logging(&self) -> &Self {
        self.enabled.store(false, Ordering::Relaxed);
        self
    }

    pub fn enable_logging(&self) -> &Self {
        self.enabled.store(true, Ordering::Relaxed);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Leave context out of envelopes; the context itself is kept
    pub fn mute_context(&self) -> &Self {
        self.mute_context.store(true, Ordering::Relaxed);
        self
    }

    pub fn unmute_context(&self) -> &Self {
        self.mute_context.store(false, Ordering::Relaxed);
        self
    }

    /// Leave metadata out of envelopes
    pub fn mute_metadata(&self) -> &Self {
        self.mute_metadata.store(true, Ordering::Relaxed);
        self
    }

    pub fn unmute_metadata(&self) -> &Self {
        self.mute_metadata.store(false, Ordering::Relaxed);
        self
    }

    pub fn is_context_muted(&self) -> bool {
        self.mute_context.load(Ordering::Relaxed)
    }

    pub fn is_metadata_muted(&self) -> bool {
        self.mute_metadata.load(Ordering::Relaxed)
    }

    /// Log only an error, without a message
    ///
    /// The error message becomes the message when `copy_msg_on_only_error`
    /// is configured (unless `opts.copy_msg` is `Some(false)`) or when
    /// `opts.copy_msg` is `Some(true)`. Logs at `Error` unless
    /// `opts.log_level` says otherwise.
    pub fn error_only(&self, error: impl Into<LoggedError>, opts: ErrorOnlyOpts) -> Result<()> {
        let error: LoggedError = error.into();
        let error_config = &self.config.error;

        let mut data = Fields::new();
        data.insert(
            error_config.field_name.clone(),
            error_config.serialize_error(&*error),
        );

        let copy_msg = match opts.copy_msg {
            Some(copy_msg) => copy_msg,
            None => error_config.copy_msg_on_only_error,
        };

        let mut messages = Vec::new();
        let message = error.to_string();
        if copy_msg && !message.is_empty() {
            messages.push(Value::String(message));
        }

        let level = opts.log_level.unwrap_or(LogLevel::Error);
        self.format_log(LogCall::new(level, messages).with_data(Some(data)))
    }

    /// Log only metadata, without a message
    ///
    /// Does nothing while metadata is muted. `on_metadata_called` plugins
    /// may rewrite the metadata or drop the call by returning `None`.
    pub fn metadata_only(&self, metadata: Fields, level: LogLevel) -> Result<()> {
        if self.is_metadata_muted() {
            self.metrics.record_metadata_dropped();
            return Ok(());
        }

        let mut data = metadata;
        if self.plugins.has_plugins(PluginCallbackType::OnMetadataCalled) {
            match self.plugins.run_on_metadata_called(data) {
                Some(transformed) => data = transformed,
                None => {
                    if self.config.console_debug {
                        eprintln!("[LogLayer] Metadata was dropped because a plugin returned None.");
                    }
                    self.metrics.record_metadata_dropped();
                    return Ok(());
                }
            }
        }

        self.format_log(LogCall::new(level, Vec::new()).with_data(Some(data)))
    }

    /// Log `messages` at `level`
    pub fn log(&self, level: LogLevel, messages: impl IntoMessages) -> Result<()> {
        let mut messages = messages.into_messages();
        self.format_message(&mut messages);
        self.format_log(LogCall::new(level, messages))
    }

    #[inline]
    pub fn info(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Info, messages)
    }

    #[inline]
    pub fn warn(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Warn, messages)
    }

    #[inline]
    pub fn error(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Error, messages)
    }

    #[inline]
    pub fn debug(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Debug, messages)
    }

    /// Sent to `debug` on backends without `trace`
    #[inline]
    pub fn trace(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Trace, messages)
    }

    /// Sent to `error` on backends without `fatal`
    #[inline]
    pub fn fatal(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Fatal, messages)
    }

    /// Only forwarded to backends exposing `silent`
    #[inline]
    pub fn silent(&self, messages: impl IntoMessages) -> Result<()> {
        self.log(LogLevel::Silent, messages)
    }

    pub(crate) fn format_message(&self, messages: &mut [Value]) {
        apply_prefix(&self.config.prefix, messages);
    }

    /// Assemble the envelope for `call`, run the plugin stages and dispatch.
    pub(crate) fn format_log(&self, call: LogCall) -> Result<()> {
        let LogCall {
            level,
            mut messages,
            data,
        } = call;

        if !self.is_enabled() {
            self.metrics.record_disabled();
            return Ok(());
        }

        let mute_context = self.is_context_muted();
        let context = self.context.read();
        let include_context = context.is_present() && !mute_context;
        let has_obj_data = data.is_some() || include_context;

        let mut envelope = if has_obj_data {
            let context_fields = include_context.then(|| context.fields().clone());
            Some(self.assemble(context_fields, data))
        } else {
            None
        };
        drop(context);

        if self.plugins.has_plugins(PluginCallbackType::OnBeforeDataOut) {
            envelope = self.plugins.run_on_before_data_out(envelope, level);
        }

        if self.plugins.has_plugins(PluginCallbackType::ShouldSendToLogger)
            && !self
                .plugins
                .run_should_send_to_logger(&messages, envelope.as_ref(), level)
        {
            self.metrics.record_vetoed();
            return Ok(());
        }

        if self.plugins.has_plugins(PluginCallbackType::OnBeforeMessageOut) {
            messages = self.plugins.run_on_before_message_out(messages, level);
        }

        // Data a plugin made up for a call that had none is not sent
        if let Some(envelope) = envelope.filter(|_| has_obj_data) {
            let profile = self.dispatcher.profile();
            if profile.requires_message && messages.is_empty() {
                messages.push(Value::String(String::new()));
            }
            profile.splice.splice(&mut messages, envelope);
        }

        match self.dispatcher.dispatch(&*self.instance, level, &messages) {
            Ok(DispatchOutcome::Sent(_)) => {
                self.metrics.record_dispatched();
                Ok(())
            }
            Ok(DispatchOutcome::Unsupported) => {
                self.metrics.record_unsupported();
                Ok(())
            }
            Err(err) => {
                self.metrics.record_dispatched();
                self.metrics.record_backend_failure();
                Err(err)
            }
        }
    }

    /// Build the envelope from context and call data.
    ///
    /// Context is merged first, so call data wins on key conflicts. When
    /// context and metadata share a field name both are nested under it.
    fn assemble(&self, context: Option<Fields>, data: Option<Fields>) -> Fields {
        let data = data.filter(|_| !self.is_metadata_muted());
        let context_field = self.config.context.field_name.as_deref();
        let metadata_field = self.config.metadata.field_name.as_deref();

        let mut envelope = Fields::new();

        match (context_field, metadata_field) {
            (Some(context_field), Some(metadata_field)) if context_field == metadata_field => {
                let mut nested = context.unwrap_or_default();
                if let Some(data) = data {
                    merge_fields(&mut nested, data);
                }
                envelope.insert(context_field.to_string(), Value::Object(nested));
            }
            _ => {
                if let Some(context) = context {
                    place(&mut envelope, context_field, context);
                }
                if let Some(data) = data {
                    place(&mut envelope, metadata_field, data);
                }
            }
        }

        envelope
    }
}

fn place(envelope: &mut Fields, field_name: Option<&str>, fields: Fields) {
    match field_name {
        Some(name) => {
            envelope.insert(name.to_string(), Value::Object(fields));
        }
        None => merge_fields(envelope, fields),
    }
}

impl<B: LogBackend + ?Sized> fmt::Debug for LogLayer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogLayer")
            .field("backend", &self.instance.name())
            .field("kind", &self.kind)
            .field("config", &self.config())
            .field("context", &*self.context.read())
            .field("plugins", &self.plugins)
            .finish()
    }
}

/// Builder for constructing a `LogLayer` with a fluent API
///
/// # Example
/// ```
/// use rust_log_layer::prelude::*;
/// use std::sync::Arc;
///
/// let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
///     .kind(BackendKind::Bunyan)
///     .error_field_name("error")
///     .copy_msg_on_only_error(true)
///     .context_field_name("context")
///     .plugin(Plugin::new().with_id("noop"))
///     .build()
///     .unwrap();
///
/// assert_eq!(log.plugins().count_plugins(None), 1);
/// ```
pub struct LogLayerBuilder<B: LogBackend + ?Sized = dyn LogBackend> {
    instance: Arc<B>,
    kind: BackendKind,
    config: LogLayerConfig,
    plugins: Vec<Plugin>,
    plugin_manager: Option<Arc<PluginManager>>,
    dispatch_table: DispatchTable,
}

impl<B: LogBackend + ?Sized> LogLayerBuilder<B> {
    pub fn new(instance: Arc<B>) -> Self {
        Self {
            instance,
            kind: BackendKind::Other,
            config: LogLayerConfig::default(),
            plugins: Vec::new(),
            plugin_manager: None,
            dispatch_table: DispatchTable::default(),
        }
    }

    /// Backend kind used to pick dispatch quirks (default `Other`)
    #[must_use = "builder methods return a new value"]
    pub fn kind(mut self, kind: BackendKind) -> Self {
        self.kind = kind;
        self
    }

    /// Replace the whole configuration, e.g. one loaded with `LogLayerConfig::from_json`
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LogLayerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Mirror every dispatch on stdout/stderr and report dropped metadata
    #[must_use = "builder methods return a new value"]
    pub fn console_debug(mut self, console_debug: bool) -> Self {
        self.config.console_debug = console_debug;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.error.field_name = field_name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&(dyn std::error::Error + 'static)) -> Value + Send + Sync + 'static,
    {
        self.config.error.serializer = Some(Arc::new(serializer));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn copy_msg_on_only_error(mut self, copy: bool) -> Self {
        self.config.error.copy_msg_on_only_error = copy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn metadata_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.metadata.field_name = Some(field_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn context_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.context.field_name = Some(field_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mute_context(mut self, mute: bool) -> Self {
        self.config.mute_context = mute;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mute_metadata(mut self, mute: bool) -> Self {
        self.config.mute_metadata = mute;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Use an existing registry instead of a fresh one
    #[must_use = "builder methods return a new value"]
    pub fn plugin_manager(mut self, manager: Arc<PluginManager>) -> Self {
        self.plugin_manager = Some(manager);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn dispatch_table(mut self, table: DispatchTable) -> Self {
        self.dispatch_table = table;
        self
    }

    /// Build the layer
    ///
    /// Fails on an invalid configuration or a duplicate plugin id.
    pub fn build(self) -> Result<LogLayer<B>> {
        self.config.validate()?;

        let plugins = self
            .plugin_manager
            .unwrap_or_else(|| Arc::new(PluginManager::new()));
        plugins.add_plugins(self.plugins)?;

        Ok(LogLayer::from_parts(
            self.instance,
            self.kind,
            self.config,
            Arc::new(self.dispatch_table),
            plugins,
            LogContext::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use crate::core::backend::BackendMethod;
    use crate::core::error::LogLayerError;
    use crate::fields;
    use serde_json::json;

    fn get_logger() -> LogLayer<MemoryBackend> {
        LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Other)
    }

    fn params(log: &LogLayer<MemoryBackend>) -> Vec<Value> {
        log.get_logger_instance()
            .last_call()
            .expect("a backend call")
            .params
    }

    #[test]
    fn test_plain_message() {
        let log = get_logger();
        log.info("hello").unwrap();

        let call = log.get_logger_instance().last_call().unwrap();
        assert_eq!(call.method, BackendMethod::Info);
        assert_eq!(call.params, vec![json!("hello")]);
    }

    #[test]
    fn test_every_level_reaches_its_method() {
        let log = get_logger();
        log.info("i").unwrap();
        log.warn("w").unwrap();
        log.error("e").unwrap();
        log.debug("d").unwrap();
        log.trace("t").unwrap();
        log.fatal("f").unwrap();
        log.silent("s").unwrap();

        let methods: Vec<_> = log
            .get_logger_instance()
            .calls()
            .into_iter()
            .map(|call| call.method)
            .collect();
        assert_eq!(
            methods,
            vec![
                BackendMethod::Info,
                BackendMethod::Warn,
                BackendMethod::Error,
                BackendMethod::Debug,
                BackendMethod::Trace,
                BackendMethod::Fatal,
                BackendMethod::Silent,
            ]
        );
    }

    #[test]
    fn test_context_is_flattened_and_prepended() {
        let log = get_logger();
        log.with_context(fields! { "test" => "context" });
        log.info("msg").unwrap();

        assert_eq!(params(&log), vec![json!({ "test": "context" }), json!("msg")]);
    }

    #[test]
    fn test_context_field_name_nests_context() {
        let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .context_field_name("ctx")
            .build()
            .unwrap();
        log.with_context(fields! { "a" => 1 });
        log.info("msg").unwrap();

        assert_eq!(params(&log), vec![json!({ "ctx": { "a": 1 } }), json!("msg")]);
    }

    #[test]
    fn test_empty_context_still_produces_envelope() {
        let log = get_logger();
        log.with_context(Fields::new());
        log.info("msg").unwrap();

        assert_eq!(params(&log), vec![json!({}), json!("msg")]);
    }

    #[test]
    fn test_distinct_field_names_keep_both() {
        let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .context_field_name("context")
            .metadata_field_name("metadata")
            .build()
            .unwrap();
        log.with_context(fields! { "x" => 1 });
        log.with_metadata(fields! { "x" => 2 }).info("msg").unwrap();

        assert_eq!(
            params(&log),
            vec![
                json!({ "context": { "x": 1 }, "metadata": { "x": 2 } }),
                json!("msg")
            ]
        );
    }

    #[test]
    fn test_shared_field_name_merges_metadata_over_context() {
        let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .context_field_name("data")
            .metadata_field_name("data")
            .build()
            .unwrap();
        log.with_context(fields! { "x" => 1, "c" => true });
        log.with_metadata(fields! { "x" => 2 }).info("msg").unwrap();

        assert_eq!(
            params(&log),
            vec![json!({ "data": { "x": 2, "c": true } }), json!("msg")]
        );
    }

    #[test]
    fn test_flattened_metadata_wins_over_context() {
        let log = get_logger();
        log.with_context(fields! { "x" => 1, "y" => 1 });
        log.with_metadata(fields! { "x" => 2 }).info("msg").unwrap();

        assert_eq!(params(&log), vec![json!({ "x": 2, "y": 1 }), json!("msg")]);
    }

    #[test]
    fn test_mute_context() {
        let log = get_logger();
        log.mute_context();
        log.with_context(fields! { "a" => 1 });
        log.info("msg").unwrap();
        assert_eq!(params(&log), vec![json!("msg")]);

        log.unmute_context();
        log.info("msg").unwrap();
        assert_eq!(params(&log), vec![json!({ "a": 1 }), json!("msg")]);
        assert_eq!(log.get_context(), fields! { "a" => 1 });
    }

    #[test]
    fn test_mute_metadata_drops_metadata_only_calls() {
        let log = get_logger();
        log.mute_metadata();
        log.metadata_only(fields! { "a" => 1 }, LogLevel::Info).unwrap();
        assert!(log.get_logger_instance().is_empty());
        assert_eq!(log.metrics().metadata_dropped(), 1);

        log.with_metadata(fields! { "a" => 1 }).info("msg").unwrap();
        assert_eq!(params(&log), vec![json!("msg")]);

        log.unmute_metadata();
        log.metadata_only(fields! { "a" => 1 }, LogLevel::Warn).unwrap();
        let call = log.get_logger_instance().last_call().unwrap();
        assert_eq!(call.method, BackendMethod::Warn);
        assert_eq!(call.params, vec![json!({ "a": 1 })]);
    }

    #[test]
    fn test_metadata_only_plugin_can_drop() {
        let log = get_logger();
        log.add_plugins([Plugin::new().on_metadata_called(|metadata| {
            (!metadata.contains_key("drop")).then_some(metadata)
        })])
        .unwrap();

        log.metadata_only(fields! { "drop" => true }, LogLevel::Info).unwrap();
        assert!(log.get_logger_instance().is_empty());

        log.metadata_only(fields! { "keep" => true }, LogLevel::Info).unwrap();
        assert_eq!(params(&log), vec![json!({ "keep": true })]);
    }

    #[test]
    fn test_error_only_defaults() {
        let log = get_logger();
        log.error_only("boom", ErrorOnlyOpts::default()).unwrap();

        let call = log.get_logger_instance().last_call().unwrap();
        assert_eq!(call.method, BackendMethod::Error);
        assert_eq!(call.params, vec![json!({ "err": "boom" })]);
    }

    #[test]
    fn test_error_only_copy_msg() {
        let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .copy_msg_on_only_error(true)
            .build()
            .unwrap();

        log.error_only("m", ErrorOnlyOpts::default()).unwrap();
        assert_eq!(params(&log), vec![json!({ "err": "m" }), json!("m")]);

        log.error_only("m", ErrorOnlyOpts::default().copy_msg(false)).unwrap();
        assert_eq!(params(&log), vec![json!({ "err": "m" })]);
    }

    #[test]
    fn test_error_only_copy_msg_override_and_level() {
        let log = get_logger();
        log.error_only("m", ErrorOnlyOpts::level(LogLevel::Warn).copy_msg(true))
            .unwrap();

        let call = log.get_logger_instance().last_call().unwrap();
        assert_eq!(call.method, BackendMethod::Warn);
        assert_eq!(call.params, vec![json!({ "err": "m" }), json!("m")]);
    }

    #[test]
    fn test_error_serializer_and_field_name() {
        let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .error_field_name("error")
            .error_serializer(|err| json!({ "msg": err.to_string() }))
            .build()
            .unwrap();

        log.with_error("bad").error("failed").unwrap();
        assert_eq!(
            params(&log),
            vec![json!({ "error": { "msg": "bad" } }), json!("failed")]
        );
    }

    #[test]
    fn test_disabled_logger_is_a_no_op() {
        let log = get_logger();
        log.disable_logging();
        log.with_context(fields! { "a" => 1 });
        log.info("x").unwrap();
        assert!(log.get_logger_instance().is_empty());
        assert_eq!(log.metrics().dropped_disabled(), 1);

        log.enable_logging();
        log.info("x").unwrap();
        assert_eq!(log.get_logger_instance().len(), 1);
        assert_eq!(params(&log), vec![json!({ "a": 1 }), json!("x")]);
    }

    #[test]
    fn test_prefix_only_on_new_instance() {
        let log = get_logger();
        let prefixed = log.with_prefix("[p]");

        prefixed.info("hi").unwrap();
        assert_eq!(params(&prefixed), vec![json!("[p] hi")]);

        log.info("hi").unwrap();
        assert_eq!(params(&log), vec![json!("hi")]);
        assert_eq!(log.prefix(), "");
    }

    #[test]
    fn test_child_copies_context() {
        let parent = get_logger();
        parent.with_context(fields! { "a" => 1 });

        let child = parent.child();
        child.with_context(fields! { "b" => 2 });
        parent.with_context(fields! { "c" => 3 });

        assert_eq!(parent.get_context(), fields! { "a" => 1, "c" => 3 });
        assert_eq!(child.get_context(), fields! { "a" => 1, "b" => 2 });
    }

    #[test]
    fn test_child_without_context_has_no_envelope() {
        let parent = get_logger();
        let child = parent.child();
        child.info("msg").unwrap();
        assert_eq!(params(&child), vec![json!("msg")]);
    }

    #[test]
    fn test_child_shares_plugins() {
        let parent = get_logger();
        let child = parent.child();

        parent
            .add_plugins([Plugin::new().with_id("veto").should_send_to_logger(|_| false)])
            .unwrap();
        child.info("x").unwrap();
        assert!(child.get_logger_instance().is_empty());

        child.disable_plugin("veto");
        parent.info("x").unwrap();
        assert_eq!(parent.get_logger_instance().len(), 1);
    }

    #[test]
    fn test_child_inherits_switches() {
        let parent = get_logger();
        parent.mute_metadata();
        parent.disable_logging();

        let child = parent.child();
        assert!(child.is_metadata_muted());
        assert!(!child.is_enabled());
    }

    #[test]
    fn test_veto_skips_message_out_and_backend() {
        let log = get_logger();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_in_plugin = Arc::clone(&ran);

        log.add_plugins([
            Plugin::new().should_send_to_logger(|_| false),
            Plugin::new().on_before_message_out(move |_| {
                ran_in_plugin.store(true, Ordering::SeqCst);
                None
            }),
        ])
        .unwrap();

        log.info("x").unwrap();
        assert!(log.get_logger_instance().is_empty());
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(log.metrics().vetoed(), 1);
    }

    #[test]
    fn test_before_data_out_sees_and_changes_envelope() {
        let log = get_logger();
        log.add_plugins([Plugin::new().on_before_data_out(|params| {
            let seen = params.data.cloned().unwrap_or_default();
            Some(fields! { "count" => seen.len() as i64 })
        })])
        .unwrap();

        log.with_metadata(fields! { "a" => 1 }).info("x").unwrap();
        assert_eq!(params(&log), vec![json!({ "a": 1, "count": 1 }), json!("x")]);
    }

    #[test]
    fn test_manufactured_data_without_payload_is_not_spliced() {
        let log = get_logger();
        log.add_plugins([Plugin::new().on_before_data_out(|_| Some(fields! { "made" => true }))])
            .unwrap();

        log.info("x").unwrap();
        assert_eq!(params(&log), vec![json!("x")]);
    }

    #[test]
    fn test_message_out_rewrites_messages() {
        let log = get_logger();
        log.add_plugins([Plugin::new().on_before_message_out(|params| {
            Some(
                params
                    .messages
                    .iter()
                    .map(|m| json!(m.as_str().unwrap_or_default().to_uppercase()))
                    .collect(),
            )
        })])
        .unwrap();

        log.with_context(fields! { "a" => 1 });
        log.info("quiet").unwrap();
        assert_eq!(params(&log), vec![json!({ "a": 1 }), json!("QUIET")]);
    }

    #[test]
    fn test_append_kind_puts_envelope_last() {
        let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Winston);
        log.with_metadata(fields! { "a" => 1 }).warn("msg").unwrap();
        assert_eq!(params(&log), vec![json!("msg"), json!({ "a": 1 })]);
    }

    #[test]
    fn test_requires_message_kind_gets_placeholder() {
        let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Roarr);
        log.metadata_only(fields! { "a" => 1 }, LogLevel::Info).unwrap();
        assert_eq!(params(&log), vec![json!({ "a": 1 }), json!("")]);

        log.error_only("boom", ErrorOnlyOpts::default()).unwrap();
        assert_eq!(params(&log), vec![json!({ "err": "boom" }), json!("")]);
    }

    #[test]
    fn test_backend_error_propagates() {
        let log = get_logger();
        log.get_logger_instance().fail_with("sink closed");

        let err = log.info("x").unwrap_err();
        assert!(matches!(err, LogLayerError::Backend { .. }));
        assert_eq!(log.metrics().backend_failures(), 1);
    }

    #[test]
    fn test_silent_without_method_is_dropped() {
        let log = LogLayer::new(
            Arc::new(MemoryBackend::with_methods(&[])),
            BackendKind::Other,
        );
        log.silent("x").unwrap();
        log.trace("t").unwrap();

        let calls = log.get_logger_instance().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, BackendMethod::Debug);
        assert_eq!(log.metrics().unsupported_level(), 1);
    }

    #[test]
    fn test_build_rejects_duplicate_plugins() {
        let result = LogLayer::builder(Arc::new(MemoryBackend::new()))
            .plugin(Plugin::new().with_id("a"))
            .plugin(Plugin::new().with_id("a"))
            .build();
        assert!(matches!(result, Err(LogLayerError::DuplicatePluginId { .. })));
    }

    #[test]
    fn test_dyn_backend_layer() {
        let backend: Arc<dyn LogBackend> = Arc::new(MemoryBackend::new());
        let log: LogLayer = LogLayer::new(backend, BackendKind::Pino);
        log.info("works").unwrap();
        assert_eq!(log.get_logger_instance().name(), "memory");
    }
}
