//! ntfy push notifier
//!
//! Posts the alert text as a plain-text body to `<base>/<topic>`.
//! Urgent alerts carry the `Priority: urgent` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::AlertEvent;
use crate::ports::{AlertError, AlertSink};

pub const DEFAULT_NTFY_BASE_URL: &str = "https://ntfy.sh";

#[derive(Debug, Clone)]
pub struct NtfyConfig {
    pub base_url: String,
    pub topic: String,
    pub timeout: Duration,
}

impl NtfyConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_NTFY_BASE_URL.to_string(),
            topic: topic.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Full topic URL
    pub fn topic_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.topic.trim_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct NtfyNotifier {
    config: NtfyConfig,
    http: Client,
}

impl NtfyNotifier {
    pub fn new(config: NtfyConfig) -> Result<Self, AlertError> {
        if config.topic.trim().is_empty() {
            return Err(AlertError::Transport("ntfy topic is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AlertError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn topic_url(&self) -> String {
        self.config.topic_url()
    }
}

#[async_trait]
impl AlertSink for NtfyNotifier {
    fn name(&self) -> &'static str {
        "ntfy"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), AlertError> {
        let mut request = self
            .http
            .post(self.config.topic_url())
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(event.message.clone());

        if event.is_urgent() {
            request = request.header("Priority", "urgent");
        }

        let response = request
            .send()
            .await
            .map_err(|e| AlertError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Rejected(status.as_u16()));
        }

        tracing::debug!("ntfy accepted alert for {}", event.symbol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_url() {
        let mut config = NtfyConfig::new("rug-alerts");
        assert_eq!(config.topic_url(), "https://ntfy.sh/rug-alerts");

        config.base_url = "http://localhost:8080/".to_string();
        assert_eq!(config.topic_url(), "http://localhost:8080/rug-alerts");
    }

    #[test]
    fn test_empty_topic_rejected() {
        assert!(NtfyNotifier::new(NtfyConfig::new("  ")).is_err());
        assert!(NtfyNotifier::new(NtfyConfig::new("alerts")).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let config = NtfyConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            topic: "t".to_string(),
            timeout: Duration::from_millis(500),
        };
        let notifier = NtfyNotifier::new(config).unwrap();
        let err = notifier
            .deliver(&AlertEvent::routine("ABC", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AlertError::Transport(_)));
    }
}
