//! # Rust Log Layer
//!
//! A logging facade that sits in front of any logging library. It keeps
//! persistent context, collects per-call metadata and errors, runs them
//! through a plugin pipeline and hands the backend a parameter list shaped
//! the way that library expects.
//!
//! ## Features
//!
//! - **Structured envelopes**: context, metadata and errors merged into one
//!   JSON object, flattened or nested under configurable keys
//! - **Plugins**: transform data and messages or veto a call
//! - **Backend quirks**: per-kind method fallbacks and envelope position
//! - **Thread safe**: every operation takes `&self`
//!
//! ```
//! use rust_log_layer::prelude::*;
//! use rust_log_layer::fields;
//! use std::sync::Arc;
//!
//! let log = LogLayer::builder(Arc::new(MemoryBackend::new()))
//!     .kind(BackendKind::Winston)
//!     .metadata_field_name("meta")
//!     .build()
//!     .unwrap();
//!
//! log.with_metadata(fields! { "order" => 17 })
//!     .info("order shipped")
//!     .unwrap();
//! ```

pub mod backends;
pub mod core;
pub mod macros;

pub use serde_json::{Map, Value};

pub mod prelude {
    pub use crate::backends::{ChannelBackend, ConsoleBackend, MemoryBackend, NullBackend};
    pub use crate::core::{
        BackendKind, BackendMethod, DispatchTable, ErrorOnlyOpts, Fields, LayerMetrics,
        LogBackend, LogBuilder, LogLayer, LogLayerBuilder, LogLayerConfig, LogLayerError,
        LogLevel, Plugin, PluginCallbackType, PluginManager, Result, SplicePosition,
    };
}

pub use backends::{ChannelBackend, ConsoleBackend, MemoryBackend, NullBackend};
#[cfg(feature = "log")]
pub use backends::LogCrateBackend;
pub use crate::core::{
    error_chain_serializer, merge_fields, BackendKind, BackendMethod, DispatchOutcome,
    DispatchProfile, DispatchTable, DispatchedCall, ErrorConfig, ErrorOnlyOpts, ErrorSerializer,
    FieldConfig, Fields, IntoMessages, LayerMetrics, LogBackend, LogBuilder, LogContext,
    LogLayer, LogLayerBuilder, LogLayerConfig, LogLayerError, LogLevel, LoggedError,
    MethodRoute, Plugin, PluginCallbackType, PluginManager, Result, SplicePosition,
};
