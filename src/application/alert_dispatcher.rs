//! Alert Dispatcher
//!
//! Best-effort delivery of alerts to the configured push sink. A failed
//! delivery is logged and dropped; the scan loop never sees it.

use std::sync::Arc;

use crate::domain::AlertEvent;
use crate::ports::AlertSink;

#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
}

impl AlertDispatcher {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    /// Send one alert. Returns whether the sink accepted it.
    pub async fn send(&self, event: AlertEvent) -> bool {
        match self.sink.deliver(&event).await {
            Ok(()) => {
                tracing::info!(
                    "Alert sent via {} ({}): {}",
                    self.sink.name(),
                    event.severity,
                    event.symbol
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to send alert for {} via {}: {}",
                    event.symbol,
                    self.sink.name(),
                    e
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("sink", &self.sink.name())
            .finish()
    }
}
