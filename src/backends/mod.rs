//! Backend implementations
//!
//! Ready-made `LogBackend`s: in-memory capture, a no-op sink, colored
//! console output, a crossbeam channel forwarder and, behind the `log`
//! feature, a bridge to the `log` crate.

pub mod channel;
pub mod console;
pub mod memory;
pub mod null;

#[cfg(feature = "log")]
pub mod log_crate;

pub use channel::ChannelBackend;
pub use console::ConsoleBackend;
pub use memory::MemoryBackend;
pub use null::NullBackend;

#[cfg(feature = "log")]
pub use log_crate::LogCrateBackend;

pub use crate::core::LogBackend;
