//! Backend trait for wrapped logging libraries

use super::error::Result;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Method exposed by a wrapped logging library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMethod {
    Info,
    Warn,
    Error,
    Debug,
    Trace,
    Fatal,
    Silent,
}

impl BackendMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            BackendMethod::Info => "info",
            BackendMethod::Warn => "warn",
            BackendMethod::Error => "error",
            BackendMethod::Debug => "debug",
            BackendMethod::Trace => "trace",
            BackendMethod::Fatal => "fatal",
            BackendMethod::Silent => "silent",
        }
    }

    /// Methods every backend must provide
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            BackendMethod::Info | BackendMethod::Warn | BackendMethod::Error | BackendMethod::Debug
        )
    }
}

impl From<LogLevel> for BackendMethod {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => BackendMethod::Trace,
            LogLevel::Debug => BackendMethod::Debug,
            LogLevel::Info => BackendMethod::Info,
            LogLevel::Warn => BackendMethod::Warn,
            LogLevel::Error => BackendMethod::Error,
            LogLevel::Fatal => BackendMethod::Fatal,
            LogLevel::Silent => BackendMethod::Silent,
        }
    }
}

impl fmt::Display for BackendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Tag identifying the wrapped logging library.
///
/// Only used to select dispatch quirks from a `DispatchTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Other,
    Console,
    Pino,
    Bunyan,
    Winston,
    Roarr,
    Consola,
    ElectronLog,
    Log4jsNode,
    Signale,
    DatadogBrowserLogs,
    /// The Rust `log` facade
    Log,
}

impl BackendKind {
    pub const ALL: [BackendKind; 12] = [
        BackendKind::Other,
        BackendKind::Console,
        BackendKind::Pino,
        BackendKind::Bunyan,
        BackendKind::Winston,
        BackendKind::Roarr,
        BackendKind::Consola,
        BackendKind::ElectronLog,
        BackendKind::Log4jsNode,
        BackendKind::Signale,
        BackendKind::DatadogBrowserLogs,
        BackendKind::Log,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            BackendKind::Other => "other",
            BackendKind::Console => "console",
            BackendKind::Pino => "pino",
            BackendKind::Bunyan => "bunyan",
            BackendKind::Winston => "winston",
            BackendKind::Roarr => "roarr",
            BackendKind::Consola => "consola",
            BackendKind::ElectronLog => "electron-log",
            BackendKind::Log4jsNode => "log4js-node",
            BackendKind::Signale => "signale",
            BackendKind::DatadogBrowserLogs => "datadog-browser-logs",
            BackendKind::Log => "log",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.to_str() == lower)
            .ok_or_else(|| format!("Unknown backend kind: '{}'", s))
    }
}

/// A wrapped logging library.
///
/// `params` holds the final positional arguments: the raw messages with the
/// structured envelope spliced in at the position the backend kind expects.
/// Errors returned here reach the caller of the log method unchanged.
pub trait LogBackend: Send + Sync {
    fn log(&self, method: BackendMethod, params: &[Value]) -> Result<()>;

    /// Whether the library exposes `method`. Only `info`, `warn`, `error`
    /// and `debug` are assumed by default.
    fn has_method(&self, method: BackendMethod) -> bool {
        method.is_required()
    }

    fn name(&self) -> &str {
        "backend"
    }
}

/// A backend invocation as recorded by the memory and channel backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedCall {
    pub method: BackendMethod,
    pub params: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchedCall {
    pub fn new(method: BackendMethod, params: &[Value]) -> Self {
        Self {
            method,
            params: params.to_vec(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_round_trips_through_str() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_str().parse::<BackendKind>(), Ok(kind));
        }
        assert!("syslog".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_serde_matches_display() {
        let json = serde_json::to_string(&BackendKind::Log4jsNode).unwrap();
        assert_eq!(json, "\"log4js-node\"");
        let kind: BackendKind = serde_json::from_str("\"datadog-browser-logs\"").unwrap();
        assert_eq!(kind, BackendKind::DatadogBrowserLogs);
    }

    #[test]
    fn test_level_maps_to_same_named_method() {
        for level in LogLevel::ALL {
            assert_eq!(BackendMethod::from(level).to_str(), level.to_str());
        }
    }
}
