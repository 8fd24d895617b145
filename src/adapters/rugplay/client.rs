//! Rugplay API Client
//!
//! HTTP client for the Rugplay market API. Every request draws the next key
//! from the shared rotator and sends it as a bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::domain::{CandlestickSample, HolderSnapshot, InstrumentSnapshot, KeyRotator};
use crate::ports::{MarketDataError, MarketDataPort};
use super::types::{parse_candles, parse_holders, parse_market_page};

/// Rugplay API client configuration
#[derive(Debug, Clone)]
pub struct RugplayConfig {
    /// Base URL, e.g. `https://rugplay.com/api/v1`
    pub api_base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for RugplayConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://rugplay.com/api/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Rugplay market data client
#[derive(Debug, Clone)]
pub struct RugplayClient {
    config: RugplayConfig,
    http: Client,
    keys: Arc<KeyRotator>,
}

impl RugplayClient {
    pub fn new(config: RugplayConfig, keys: Arc<KeyRotator>) -> Result<Self, MarketDataError> {
        Url::parse(&config.api_base_url)
            .map_err(|e| MarketDataError::Transport(format!("Invalid base URL '{}': {}", config.api_base_url, e)))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http, keys })
    }

    /// Build `<base>/<segments...>` with each segment percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, MarketDataError> {
        let mut url = Url::parse(&self.config.api_base_url)
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| MarketDataError::Transport("Base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// GET a URL with the next credential and return the body text
    async fn get_text(&self, url: Url, query: &[(&str, String)]) -> Result<String, MarketDataError> {
        let path = url.path().to_string();

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(self.keys.next())
            .send()
            .await
            .map_err(|e| MarketDataError::Transport(format!("{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::Transport(format!(
                "{} returned {}: {}",
                path,
                status,
                truncate(&body, 200)
            )));
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::Transport(format!("{}: failed to read body: {}", path, e)))
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl MarketDataPort for RugplayClient {
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<InstrumentSnapshot>, MarketDataError> {
        let url = self.endpoint(&["market"])?;
        let body = self
            .get_text(
                url,
                &[
                    ("sortBy", "createdAt".to_string()),
                    ("sortOrder", "desc".to_string()),
                    ("limit", page_size.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;

        let instruments = parse_market_page(&body)?;
        tracing::debug!("Fetched {} listings from market page {}", instruments.len(), page);
        Ok(instruments)
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Vec<CandlestickSample>, MarketDataError> {
        let url = self.endpoint(&["coin", symbol])?;
        let body = self
            .get_text(url, &[("timeframe", timeframe.to_string())])
            .await?;
        parse_candles(&body)
    }

    async fn fetch_holders(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<HolderSnapshot, MarketDataError> {
        let url = self.endpoint(&["holders", symbol])?;
        let body = self.get_text(url, &[("limit", limit.to_string())]).await?;
        parse_holders(&body)
    }
}
