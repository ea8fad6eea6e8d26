//! In-memory backend that records every call
//!
//! Useful in tests and for inspecting exactly which method and parameter
//! list a `LogLayer` produced.

use crate::core::{BackendMethod, DispatchedCall, LogBackend, LogLayerError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;

/// Records calls in order
///
/// # Example
///
/// ```
/// use rust_log_layer::backends::MemoryBackend;
/// use rust_log_layer::{BackendMethod, LogBackend};
/// use serde_json::json;
///
/// // A library without `trace`, `fatal` or `silent`
/// let backend = MemoryBackend::with_methods(&[]);
/// assert!(!backend.has_method(BackendMethod::Trace));
///
/// backend.log(BackendMethod::Info, &[json!("hello")]).unwrap();
/// assert_eq!(backend.last_call().unwrap().params, vec![json!("hello")]);
/// ```
#[derive(Debug)]
pub struct MemoryBackend {
    methods: HashSet<BackendMethod>,
    calls: Mutex<Vec<DispatchedCall>>,
    failure: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Backend exposing every method, including `trace`, `fatal` and `silent`
    pub fn new() -> Self {
        Self::with_methods(&[
            BackendMethod::Trace,
            BackendMethod::Fatal,
            BackendMethod::Silent,
        ])
    }

    /// Backend exposing `info`, `warn`, `error`, `debug` plus `extra`
    pub fn with_methods(extra: &[BackendMethod]) -> Self {
        let mut methods: HashSet<BackendMethod> = [
            BackendMethod::Info,
            BackendMethod::Warn,
            BackendMethod::Error,
            BackendMethod::Debug,
        ]
        .into_iter()
        .collect();
        methods.extend(extra.iter().copied());

        Self {
            methods,
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Make every following call fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Stop failing
    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn calls(&self) -> Vec<DispatchedCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<DispatchedCall> {
        self.calls.lock().last().cloned()
    }

    /// Recorded calls for one method
    pub fn calls_for(&self, method: BackendMethod) -> Vec<DispatchedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBackend for MemoryBackend {
    fn log(&self, method: BackendMethod, params: &[Value]) -> Result<()> {
        if let Some(message) = self.failure.lock().as_ref() {
            return Err(LogLayerError::backend(self.name(), message.clone()));
        }

        self.calls.lock().push(DispatchedCall::new(method, params));
        Ok(())
    }

    fn has_method(&self, method: BackendMethod) -> bool {
        self.methods.contains(&method)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_in_order() {
        let backend = MemoryBackend::new();
        backend.log(BackendMethod::Info, &[json!("a")]).unwrap();
        backend.log(BackendMethod::Warn, &[json!("b")]).unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].method, BackendMethod::Info);
        assert_eq!(calls[1].params, vec![json!("b")]);
        assert_eq!(backend.calls_for(BackendMethod::Warn).len(), 1);
    }

    #[test]
    fn test_method_sets() {
        let full = MemoryBackend::new();
        let basic = MemoryBackend::with_methods(&[]);

        for method in [BackendMethod::Trace, BackendMethod::Fatal, BackendMethod::Silent] {
            assert!(full.has_method(method));
            assert!(!basic.has_method(method));
        }
        assert!(basic.has_method(BackendMethod::Debug));
    }

    #[test]
    fn test_failure_mode() {
        let backend = MemoryBackend::new();
        backend.fail_with("disk full");
        assert!(backend.log(BackendMethod::Info, &[]).is_err());
        assert!(backend.is_empty());

        backend.recover();
        backend.log(BackendMethod::Info, &[]).unwrap();
        assert_eq!(backend.len(), 1);

        backend.clear();
        assert!(backend.is_empty());
    }
}
