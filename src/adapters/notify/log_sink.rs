use async_trait::async_trait;

use crate::domain::AlertEvent;
use crate::ports::{AlertError, AlertSink};

/// Sink that only writes alerts to the log. Used when no ntfy topic is set.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), AlertError> {
        if event.is_urgent() {
            tracing::warn!("[ALERT {}] {}", event.symbol, event.message);
        } else {
            tracing::info!("[ALERT {}] {}", event.symbol, event.message);
        }
        Ok(())
    }
}
