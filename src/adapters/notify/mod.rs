//! Notification Adapters
//!
//! Implementations of the AlertSink port.

mod log_sink;
mod ntfy;

pub use log_sink::LogSink;
pub use ntfy::{NtfyConfig, NtfyNotifier, DEFAULT_NTFY_BASE_URL};
