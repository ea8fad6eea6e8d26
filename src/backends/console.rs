//! Console backend implementation

use crate::core::{render_params, BackendMethod, LogBackend, Result};
#[cfg(feature = "console")]
use crate::core::LogLevel;
use chrono::Utc;
use serde_json::Value;
use std::io::Write;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Writes one line per call to stdout, or stderr for `warn` and `error`
///
/// Has `trace` but neither `fatal` nor `silent`, so fatal calls land on
/// `error` and silent calls are dropped.
pub struct ConsoleBackend {
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
    timestamp_format: String,
}

impl ConsoleBackend {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set a strftime-compatible timestamp format
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_layer::backends::ConsoleBackend;
    ///
    /// let backend = ConsoleBackend::new().with_timestamp_format("%H:%M:%S");
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = format.into();
        self
    }

    fn format_line(&self, method: BackendMethod, params: &[Value]) -> String {
        format!(
            "[{}] [{}] {}",
            Utc::now().format(&self.timestamp_format),
            self.label(method),
            render_params(params)
        )
    }

    #[cfg(feature = "console")]
    fn label(&self, method: BackendMethod) -> String {
        use colored::Colorize;

        let label = format!("{:5}", method.to_str());
        if !self.use_colors {
            return label;
        }

        let level = match method {
            BackendMethod::Trace => LogLevel::Trace,
            BackendMethod::Debug => LogLevel::Debug,
            BackendMethod::Warn => LogLevel::Warn,
            BackendMethod::Error => LogLevel::Error,
            BackendMethod::Fatal => LogLevel::Fatal,
            BackendMethod::Info | BackendMethod::Silent => LogLevel::Info,
        };
        label.color(level.color_code()).to_string()
    }

    #[cfg(not(feature = "console"))]
    fn label(&self, method: BackendMethod) -> String {
        format!("{:5}", method.to_str())
    }
}

impl Default for ConsoleBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBackend for ConsoleBackend {
    fn log(&self, method: BackendMethod, params: &[Value]) -> Result<()> {
        let line = self.format_line(method, params);

        match method {
            BackendMethod::Warn | BackendMethod::Error => {
                writeln!(std::io::stderr().lock(), "{}", line)?;
            }
            _ => {
                writeln!(std::io::stdout().lock(), "{}", line)?;
            }
        }
        Ok(())
    }

    fn has_method(&self, method: BackendMethod) -> bool {
        method.is_required() || method == BackendMethod::Trace
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_line_format() {
        let backend = ConsoleBackend::with_colors(false).with_timestamp_format("TS");
        let line = backend.format_line(BackendMethod::Info, &[json!({ "a": 1 }), json!("hi")]);
        assert_eq!(line, "[TS] [info ] {\"a\":1} hi");
    }

    #[test]
    fn test_methods() {
        let backend = ConsoleBackend::new();
        assert!(backend.has_method(BackendMethod::Trace));
        assert!(!backend.has_method(BackendMethod::Fatal));
        assert!(!backend.has_method(BackendMethod::Silent));
    }

    #[test]
    fn test_log_writes() {
        let backend = ConsoleBackend::with_colors(false);
        assert!(backend.log(BackendMethod::Debug, &[json!("console test")]).is_ok());
    }
}
