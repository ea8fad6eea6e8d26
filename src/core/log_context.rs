//! Structured data containers
//!
//! This module provides:
//! - `Fields`: the mapping type used for context, metadata and envelopes
//! - `LogContext`: persistent per-layer context, copied (never shared) into children
//! - `merge_fields`: the shallow "right side wins" union used by every merge step

use serde_json::{Map, Value};

/// Mapping of field names to structured values
pub type Fields = Map<String, Value>;

/// Shallow union of `source` into `target`. Keys from `source` win.
pub fn merge_fields(target: &mut Fields, source: Fields) {
    for (key, value) in source {
        target.insert(key, value);
    }
}

/// Persistent context attached to every entry emitted by a `LogLayer`
///
/// A context that was never written to is *absent*, which is distinct from a
/// context that was written with an empty mapping: only a present context
/// contributes an envelope.
///
/// # Example
///
/// ```
/// use rust_log_layer::{fields, LogContext};
///
/// let mut ctx = LogContext::new();
/// assert!(!ctx.is_present());
///
/// ctx.merge(fields! { "service" => "api-gateway" });
/// ctx.merge(fields! { "version" => "1.2.3" });
///
/// assert!(ctx.is_present());
/// assert_eq!(ctx.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    fields: Fields,
    present: bool,
}

impl LogContext {
    /// Create a new absent context
    pub fn new() -> Self {
        Self {
            fields: Fields::new(),
            present: false,
        }
    }

    /// Shallow-merge `fields` into the context and mark it present
    pub fn merge(&mut self, fields: Fields) {
        merge_fields(&mut self.fields, fields);
        self.present = true;
    }

    /// Get all fields
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Whether `merge` was ever called on this context
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
