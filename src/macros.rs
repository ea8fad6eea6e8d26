//! Macros for building fields and logging formatted messages.
//!
//! # Examples
//!
//! ```
//! use rust_log_layer::prelude::*;
//! use rust_log_layer::{fields, info};
//! use std::sync::Arc;
//!
//! let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Pino);
//!
//! log.with_context(fields! { "service" => "billing", "pid" => 4242 });
//!
//! let port = 8080;
//! info!(log, "listening on port {}", port).unwrap();
//! ```

/// Build a `Fields` map from `key => value` pairs.
///
/// Values go through `serde_json::Value::from`.
///
/// ```
/// use rust_log_layer::fields;
/// use serde_json::json;
///
/// let fields = fields! { "user" => "ana", "attempts" => 3, "admin" => false };
/// assert_eq!(fields["attempts"], json!(3));
/// assert!(fields! {}.is_empty());
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Fields::new();
        $(
            fields.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        fields
    }};
}

/// Log a formatted message at the given level.
///
/// Works with a `LogLayer` or a `LogBuilder` and returns the call's `Result`.
///
/// ```
/// # use rust_log_layer::prelude::*;
/// # use std::sync::Arc;
/// # let log = LogLayer::new(Arc::new(MemoryBackend::new()), BackendKind::Other);
/// use rust_log_layer::log;
/// log!(log, LogLevel::Info, "Simple message").unwrap();
/// log!(log.with_metadata(Fields::new()), LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
