//! Bridge to the `log` facade
//!
//! Lets a `LogLayer` feed whatever logger the application installed with
//! `log::set_logger`.

use crate::core::{render_params, BackendMethod, LogBackend, Result};
use serde_json::Value;

/// Forwards calls to the `log` crate macros under a fixed target
///
/// `fatal` is not a `log` level and is reported as unavailable, so fatal
/// calls arrive as `Error`.
#[derive(Debug, Clone)]
pub struct LogCrateBackend {
    target: String,
}

impl LogCrateBackend {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn level(method: BackendMethod) -> Option<log::Level> {
        match method {
            BackendMethod::Trace => Some(log::Level::Trace),
            BackendMethod::Debug => Some(log::Level::Debug),
            BackendMethod::Info => Some(log::Level::Info),
            BackendMethod::Warn => Some(log::Level::Warn),
            BackendMethod::Error => Some(log::Level::Error),
            BackendMethod::Fatal | BackendMethod::Silent => None,
        }
    }
}

impl Default for LogCrateBackend {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

impl LogBackend for LogCrateBackend {
    fn log(&self, method: BackendMethod, params: &[Value]) -> Result<()> {
        if let Some(level) = Self::level(method) {
            if log::log_enabled!(target: &self.target, level) {
                log::log!(target: &self.target, level, "{}", render_params(params));
            }
        }
        Ok(())
    }

    fn has_method(&self, method: BackendMethod) -> bool {
        Self::level(method).is_some()
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_mapping() {
        let backend = LogCrateBackend::default();
        assert!(backend.has_method(BackendMethod::Trace));
        assert!(!backend.has_method(BackendMethod::Fatal));
        assert!(!backend.has_method(BackendMethod::Silent));
        assert_eq!(backend.target(), "rust_log_layer");
    }

    #[test]
    fn test_log_without_logger_installed() {
        let backend = LogCrateBackend::new("test");
        assert!(backend.log(BackendMethod::Info, &[Value::from("x")]).is_ok());
    }
}
