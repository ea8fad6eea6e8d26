//! Per-layer emission counters
//!
//! Tracks what happened to every log call: dispatched to the backend, or
//! dropped by one of the silent drop paths.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one `LogLayer`; children start from zero
///
/// # Example
///
/// ```
/// use rust_log_layer::LayerMetrics;
///
/// let metrics = LayerMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_vetoed();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.dropped(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LayerMetrics {
    /// Calls handed to the backend (including ones the backend failed)
    dispatched: AtomicU64,

    /// Calls made while logging was disabled
    dropped_disabled: AtomicU64,

    /// Calls vetoed by `should_send_to_logger`
    vetoed: AtomicU64,

    /// `metadata_only` calls dropped by muting or a plugin
    metadata_dropped: AtomicU64,

    /// Calls whose severity had no method on the backend
    unsupported_level: AtomicU64,

    /// Backend calls that returned an error
    backend_failures: AtomicU64,
}

impl LayerMetrics {
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            dropped_disabled: AtomicU64::new(0),
            vetoed: AtomicU64::new(0),
            metadata_dropped: AtomicU64::new(0),
            unsupported_level: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_disabled(&self) -> u64 {
        self.dropped_disabled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn vetoed(&self) -> u64 {
        self.vetoed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn metadata_dropped(&self) -> u64 {
        self.metadata_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn unsupported_level(&self) -> u64 {
        self.unsupported_level.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backend_failures(&self) -> u64 {
        self.backend_failures.load(Ordering::Relaxed)
    }

    /// Sum of all silent drops
    pub fn dropped(&self) -> u64 {
        self.dropped_disabled() + self.vetoed() + self.metadata_dropped() + self.unsupported_level()
    }

    pub fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_disabled(&self) {
        self.dropped_disabled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vetoed(&self) {
        self.vetoed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_metadata_dropped(&self) {
        self.metadata_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unsupported(&self) {
        self.unsupported_level.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.dropped_disabled.store(0, Ordering::Relaxed);
        self.vetoed.store(0, Ordering::Relaxed);
        self.metadata_dropped.store(0, Ordering::Relaxed);
        self.unsupported_level.store(0, Ordering::Relaxed);
        self.backend_failures.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = LayerMetrics::new();
        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.dropped(), 0);
        assert_eq!(metrics.backend_failures(), 0);
    }

    #[test]
    fn test_dropped_sums_drop_paths() {
        let metrics = LayerMetrics::new();
        metrics.record_disabled();
        metrics.record_vetoed();
        metrics.record_metadata_dropped();
        metrics.record_unsupported();
        metrics.record_backend_failure();

        assert_eq!(metrics.dropped(), 4);
        assert_eq!(metrics.backend_failures(), 1);
    }

    #[test]
    fn test_reset() {
        let metrics = LayerMetrics::new();
        metrics.record_dispatched();
        metrics.record_vetoed();
        metrics.reset();

        assert_eq!(metrics.dispatched(), 0);
        assert_eq!(metrics.dropped(), 0);
    }
}
