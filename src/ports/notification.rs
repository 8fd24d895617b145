use async_trait::async_trait;
use thiserror::Error;

use crate::domain::AlertEvent;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlertError {
    #[error("Delivery failed: {0}")]
    Transport(String),

    #[error("Sink rejected message with status {0}")]
    Rejected(u16),
}

/// Push-notification sink
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Deliver one alert. No retries are expected from implementations.
    async fn deliver(&self, event: &AlertEvent) -> Result<(), AlertError>;
}
