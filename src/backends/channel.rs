//! Backend that forwards calls over a crossbeam channel
//!
//! The receiving side decides what to do with each `DispatchedCall`, e.g. a
//! worker thread writing them out in batches.

use crate::core::{BackendMethod, DispatchedCall, LogBackend, LogLayerError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use serde_json::Value;
use std::time::Duration;

/// Forwards every call to a channel
///
/// # Example
///
/// ```
/// use rust_log_layer::prelude::*;
/// use std::sync::Arc;
///
/// let (backend, receiver) = ChannelBackend::bounded(16);
/// let log = LogLayer::new(Arc::new(backend), BackendKind::Other);
///
/// log.warn("disk almost full").unwrap();
///
/// let call = receiver.try_recv().unwrap();
/// assert_eq!(call.method, BackendMethod::Warn);
/// ```
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    sender: Sender<DispatchedCall>,
    send_timeout: Option<Duration>,
}

impl ChannelBackend {
    /// Channel holding at most `capacity` calls; a full channel blocks the caller
    pub fn bounded(capacity: usize) -> (Self, Receiver<DispatchedCall>) {
        let (sender, receiver) = bounded(capacity);
        (
            Self {
                sender,
                send_timeout: None,
            },
            receiver,
        )
    }

    pub fn unbounded() -> (Self, Receiver<DispatchedCall>) {
        let (sender, receiver) = unbounded();
        (
            Self {
                sender,
                send_timeout: None,
            },
            receiver,
        )
    }

    /// Fail instead of blocking forever when the channel stays full
    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Calls waiting in the channel
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}

impl LogBackend for ChannelBackend {
    fn log(&self, method: BackendMethod, params: &[Value]) -> Result<()> {
        let call = DispatchedCall::new(method, params);

        match self.send_timeout {
            Some(timeout) => match self.sender.send_timeout(call, timeout) {
                Ok(()) => Ok(()),
                Err(SendTimeoutError::Timeout(_)) => Err(LogLayerError::backend(
                    self.name(),
                    format!("channel still full after {:?}", timeout),
                )),
                Err(SendTimeoutError::Disconnected(_)) => Err(LogLayerError::ChannelSend),
            },
            None => self
                .sender
                .send(call)
                .map_err(|_| LogLayerError::ChannelSend),
        }
    }

    fn has_method(&self, _method: BackendMethod) -> bool {
        true
    }

    fn name(&self) -> &str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_forwards_calls() {
        let (backend, receiver) = ChannelBackend::unbounded();
        backend.log(BackendMethod::Fatal, &[json!("down")]).unwrap();
        assert_eq!(backend.pending(), 1);

        let call = receiver.recv().unwrap();
        assert_eq!(call.method, BackendMethod::Fatal);
        assert_eq!(call.params, vec![json!("down")]);
    }

    #[test]
    fn test_disconnected_receiver() {
        let (backend, receiver) = ChannelBackend::bounded(1);
        drop(receiver);

        let err = backend.log(BackendMethod::Info, &[]).unwrap_err();
        assert!(matches!(err, LogLayerError::ChannelSend));
    }

    #[test]
    fn test_send_timeout_on_full_channel() {
        let (backend, _receiver) = ChannelBackend::bounded(1);
        let backend = backend.with_send_timeout(Duration::from_millis(10));

        backend.log(BackendMethod::Info, &[]).unwrap();
        let err = backend.log(BackendMethod::Info, &[]).unwrap_err();
        assert!(matches!(err, LogLayerError::Backend { .. }));
    }
}
