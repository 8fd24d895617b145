use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::CandlestickSample;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Ranking request failed: {0}")]
    Transport(String),

    #[error("Ranking response malformed: {0}")]
    Parse(String),

    #[error("Ranking service not configured: {0}")]
    NotConfigured(String),
}

/// Per-candidate facts sent to the ranking service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePayload {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: Option<f64>,
    pub price_history: Vec<CandlestickSample>,
    pub total_holders: Option<u64>,
    pub top_holder_percentage: Option<f64>,
    pub holders_quantity_distribution: BTreeMap<String, usize>,
}

/// One entry of a ranked response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCoin {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub investment_potential: Value,
    /// Any further fields the service chose to include
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Result of a ranking call
#[derive(Debug, Clone, PartialEq)]
pub enum RankingOutcome {
    Ranked(Vec<RankedCoin>),
    /// Content that was not a `{"rankedCoins": [...]}` object, verbatim
    Raw(String),
}

impl RankingOutcome {
    /// Interpret the service's message content
    pub fn from_content(content: &str) -> Self {
        let parsed: Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Ranking content is not JSON ({}), keeping raw text", e);
                return RankingOutcome::Raw(content.to_string());
            }
        };

        let ranked = parsed
            .get("rankedCoins")
            .cloned()
            .map(serde_json::from_value::<Vec<RankedCoin>>);

        match ranked {
            Some(Ok(coins)) => RankingOutcome::Ranked(coins),
            Some(Err(e)) => {
                tracing::warn!("rankedCoins has unexpected shape: {}", e);
                RankingOutcome::Raw(content.to_string())
            }
            None => RankingOutcome::Raw(content.to_string()),
        }
    }
}

/// External ranking service
#[async_trait]
pub trait RankingPort: Send + Sync {
    async fn rank(&self, candidates: &[CandidatePayload]) -> Result<RankingOutcome, RankingError>;
}
