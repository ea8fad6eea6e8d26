//! Backend dispatch
//!
//! All backend-specific calling conventions live in `DispatchTable`: which
//! method a severity lands on when the backend lacks it, where the envelope
//! goes in the parameter list, and whether the backend insists on a message.

use super::backend::{BackendKind, BackendMethod, LogBackend};
use super::error::Result;
use super::log_context::Fields;
use super::log_level::LogLevel;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Write;

/// Where the envelope is spliced into the parameter list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplicePosition {
    /// `[envelope, ...messages]`
    #[default]
    Prepend,
    /// `[...messages, envelope]`
    Append,
}

impl SplicePosition {
    pub fn splice(&self, messages: &mut Vec<Value>, envelope: Fields) {
        match self {
            SplicePosition::Prepend => messages.insert(0, Value::Object(envelope)),
            SplicePosition::Append => messages.push(Value::Object(envelope)),
        }
    }
}

/// Method a severity is sent to, with an optional fallback for backends
/// that do not expose the primary method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodRoute {
    pub primary: BackendMethod,
    pub fallback: Option<BackendMethod>,
}

impl MethodRoute {
    pub const fn direct(method: BackendMethod) -> Self {
        Self {
            primary: method,
            fallback: None,
        }
    }

    pub const fn with_fallback(primary: BackendMethod, fallback: BackendMethod) -> Self {
        Self {
            primary,
            fallback: Some(fallback),
        }
    }

    /// `None` when neither the primary nor the fallback is available
    pub fn resolve<B: LogBackend + ?Sized>(&self, backend: &B) -> Option<BackendMethod> {
        if backend.has_method(self.primary) {
            return Some(self.primary);
        }
        self.fallback.filter(|method| backend.has_method(*method))
    }
}

/// Calling convention of one backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchProfile {
    pub trace: MethodRoute,
    pub fatal: MethodRoute,
    pub splice: SplicePosition,
    /// Backend rejects entries without a message; an empty string is sent
    /// when only envelope data is present
    pub requires_message: bool,
}

impl Default for DispatchProfile {
    fn default() -> Self {
        Self {
            trace: MethodRoute::with_fallback(BackendMethod::Trace, BackendMethod::Debug),
            fatal: MethodRoute::with_fallback(BackendMethod::Fatal, BackendMethod::Error),
            splice: SplicePosition::Prepend,
            requires_message: false,
        }
    }
}

impl DispatchProfile {
    pub fn route(&self, level: LogLevel) -> MethodRoute {
        match level {
            LogLevel::Trace => self.trace,
            LogLevel::Fatal => self.fatal,
            other => MethodRoute::direct(other.into()),
        }
    }

    /// Built-in profile for `kind`
    pub fn for_kind(kind: BackendKind) -> Self {
        let base = Self::default();
        match kind {
            // trace exists on winston but does not behave as a level
            BackendKind::Winston => Self {
                trace: MethodRoute::direct(BackendMethod::Debug),
                fatal: MethodRoute::direct(BackendMethod::Error),
                splice: SplicePosition::Append,
                ..base
            },
            BackendKind::Signale => Self {
                trace: MethodRoute::direct(BackendMethod::Debug),
                splice: SplicePosition::Append,
                ..base
            },
            BackendKind::ElectronLog => Self {
                fatal: MethodRoute::direct(BackendMethod::Error),
                splice: SplicePosition::Append,
                ..base
            },
            BackendKind::Console => Self {
                fatal: MethodRoute::direct(BackendMethod::Error),
                ..base
            },
            BackendKind::Consola | BackendKind::Log4jsNode | BackendKind::DatadogBrowserLogs => {
                Self {
                    splice: SplicePosition::Append,
                    ..base
                }
            }
            BackendKind::Roarr => Self {
                requires_message: true,
                ..base
            },
            BackendKind::Other | BackendKind::Pino | BackendKind::Bunyan | BackendKind::Log => {
                base
            }
        }
    }
}

/// Per-kind dispatch profiles, with overrides
///
/// # Example
///
/// ```
/// use rust_log_layer::{BackendKind, DispatchTable, SplicePosition};
///
/// let mut table = DispatchTable::default();
/// assert_eq!(table.profile(BackendKind::Winston).splice, SplicePosition::Append);
///
/// table.set_splice(BackendKind::Pino, SplicePosition::Append);
/// assert_eq!(table.profile(BackendKind::Pino).splice, SplicePosition::Append);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    overrides: HashMap<BackendKind, DispatchProfile>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self, kind: BackendKind) -> DispatchProfile {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| DispatchProfile::for_kind(kind))
    }

    pub fn set_profile(&mut self, kind: BackendKind, profile: DispatchProfile) {
        self.overrides.insert(kind, profile);
    }

    pub fn set_splice(&mut self, kind: BackendKind, splice: SplicePosition) {
        let mut profile = self.profile(kind);
        profile.splice = splice;
        self.set_profile(kind, profile);
    }

    pub fn set_requires_message(&mut self, kind: BackendKind, requires_message: bool) {
        let mut profile = self.profile(kind);
        profile.requires_message = requires_message;
        self.set_profile(kind, profile);
    }
}

/// Side-channel copy of every dispatch on the process console
///
/// Write failures and panics are swallowed; the mirror never affects the
/// primary dispatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMirror;

impl ConsoleMirror {
    /// Console method a severity is mirrored on; `None` for `Silent`
    pub fn method_for(level: LogLevel) -> Option<BackendMethod> {
        match level {
            LogLevel::Info => Some(BackendMethod::Info),
            LogLevel::Warn => Some(BackendMethod::Warn),
            LogLevel::Error => Some(BackendMethod::Error),
            LogLevel::Debug | LogLevel::Trace | LogLevel::Fatal => Some(BackendMethod::Debug),
            LogLevel::Silent => None,
        }
    }

    pub fn mirror(&self, level: LogLevel, params: &[Value]) {
        let Some(method) = Self::method_for(level) else {
            return;
        };

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let line = format!("{} {}", Self::label(method), render_params(params));
            let _ = match method {
                BackendMethod::Warn | BackendMethod::Error => {
                    writeln!(std::io::stderr().lock(), "{}", line)
                }
                _ => writeln!(std::io::stdout().lock(), "{}", line),
            };
        }));
    }

    #[cfg(feature = "console")]
    fn label(method: BackendMethod) -> String {
        use colored::Colorize;
        let level = match method {
            BackendMethod::Warn => LogLevel::Warn,
            BackendMethod::Error => LogLevel::Error,
            BackendMethod::Debug => LogLevel::Debug,
            _ => LogLevel::Info,
        };
        format!("[{:5}]", method.to_str())
            .color(level.color_code())
            .to_string()
    }

    #[cfg(not(feature = "console"))]
    fn label(method: BackendMethod) -> String {
        format!("[{:5}]", method.to_str())
    }
}

/// Space-separated rendering of a parameter list: strings verbatim,
/// everything else as compact JSON
pub fn render_params(params: &[Value]) -> String {
    params
        .iter()
        .map(|param| match param {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of a dispatch that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent(BackendMethod),
    /// No method for the severity on this backend
    Unsupported,
}

/// Sends the final parameter list to the backend method chosen by the
/// profile of its kind
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    profile: DispatchProfile,
    mirror: Option<ConsoleMirror>,
}

impl Dispatcher {
    pub fn new(profile: DispatchProfile, console_debug: bool) -> Self {
        Self {
            profile,
            mirror: console_debug.then_some(ConsoleMirror),
        }
    }

    pub fn profile(&self) -> &DispatchProfile {
        &self.profile
    }

    /// Backend errors are returned unchanged; nothing is retried.
    pub fn dispatch<B: LogBackend + ?Sized>(
        &self,
        backend: &B,
        level: LogLevel,
        params: &[Value],
    ) -> Result<DispatchOutcome> {
        if let Some(mirror) = &self.mirror {
            mirror.mirror(level, params);
        }

        match self.profile.route(level).resolve(backend) {
            Some(method) => {
                backend.log(method, params)?;
                Ok(DispatchOutcome::Sent(method))
            }
            None => Ok(DispatchOutcome::Unsupported),
        }
    }
}
