//! Core log layer types and traits

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod log_builder;
pub mod log_context;
pub mod log_entry;
pub mod log_layer;
pub mod log_level;
pub mod metrics;
pub mod plugin;
pub mod plugin_manager;

pub use backend::{BackendKind, BackendMethod, DispatchedCall, LogBackend};
pub use config::{
    error_chain_serializer, ErrorConfig, ErrorOnlyOpts, ErrorSerializer, FieldConfig,
    LogLayerConfig, LoggedError, DEFAULT_ERROR_FIELD,
};
pub use dispatch::{
    render_params, ConsoleMirror, DispatchOutcome, DispatchProfile, DispatchTable, Dispatcher,
    MethodRoute, SplicePosition,
};
pub use error::{LogLayerError, Result};
pub use log_builder::LogBuilder;
pub use log_context::{merge_fields, Fields, LogContext};
pub use log_entry::{IntoMessages, LogCall};
pub use log_layer::{LogLayer, LogLayerBuilder};
pub use log_level::LogLevel;
pub use metrics::LayerMetrics;
pub use plugin::{
    BeforeDataOutFn, BeforeDataOutParams, BeforeMessageOutFn, BeforeMessageOutParams,
    MetadataCalledFn, Plugin, PluginCallbackType, ShouldSendFn, ShouldSendParams,
};
pub use plugin_manager::PluginManager;
