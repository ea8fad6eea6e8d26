//! Backend that discards everything

use crate::core::{BackendMethod, LogBackend, Result};
use serde_json::Value;

/// Accepts every method and drops the call
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl NullBackend {
    pub fn new() -> Self {
        Self
    }
}

impl LogBackend for NullBackend {
    fn log(&self, _method: BackendMethod, _params: &[Value]) -> Result<()> {
        Ok(())
    }

    fn has_method(&self, _method: BackendMethod) -> bool {
        true
    }

    fn name(&self) -> &str {
        "null"
    }
}
