//! Groq chat-completion client
//!
//! Sends the candidate payload as the user message and interprets the first
//! choice's content as the ranking.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{CandidatePayload, RankingError, RankingOutcome, RankingPort};

pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

const SYSTEM_PROMPT: &str = "You are a crypto analyst. Given a list of coins with price history, \
metadata, and holder stats, return ONLY a JSON object with a key called 'rankedCoins'. This should \
be a list of coin objects, each containing exactly these fields: symbol (string), name (string), \
and investmentPotential (number). Do NOT include any other fields, price history, or detailed \
holder info. Return no extra text or explanation.";

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Duration,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GROQ_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct GroqRanker {
    config: GroqConfig,
    http: Client,
}

impl GroqRanker {
    pub fn new(config: GroqConfig) -> Result<Self, RankingError> {
        if config.api_key.trim().is_empty() {
            return Err(RankingError::NotConfigured("GROQ_API_KEY is not set".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RankingError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    fn build_messages(candidates: &[CandidatePayload]) -> Result<Vec<ChatMessage>, RankingError> {
        let payload = serde_json::to_string(candidates)
            .map_err(|e| RankingError::Parse(format!("Failed to serialise payload: {}", e)))?;

        Ok(vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Rank these coins:\n{}", payload),
            },
        ])
    }
}

/// Pull the first choice's content out of a chat-completion body
fn extract_content(body: &str) -> Result<String, RankingError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| RankingError::Parse(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| RankingError::Parse("response has no choices".to_string()))
}

#[async_trait]
impl RankingPort for GroqRanker {
    async fn rank(&self, candidates: &[CandidatePayload]) -> Result<RankingOutcome, RankingError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: Self::build_messages(candidates)?,
            temperature: self.config.temperature,
        };

        tracing::info!("Requesting ranking for {} candidates", candidates.len());

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RankingError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RankingError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RankingError::Transport(format!("status {}: {}", status, body)));
        }

        let content = extract_content(&body)?;
        tracing::debug!("Ranking content: {}", content);
        Ok(RankingOutcome::from_content(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn payload() -> CandidatePayload {
        CandidatePayload {
            symbol: "AAA".to_string(),
            name: "Alpha".to_string(),
            current_price: 0.5,
            market_cap: Some(1000.0),
            price_history: Vec::new(),
            total_holders: None,
            top_holder_percentage: None,
            holders_quantity_distribution: BTreeMap::new(),
        }
    }

    #[test]
    fn test_missing_key_not_configured() {
        let err = GroqRanker::new(GroqConfig::default()).unwrap_err();
        assert!(matches!(err, RankingError::NotConfigured(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: DEFAULT_GROQ_MODEL,
            messages: GroqRanker::build_messages(&[payload()]).unwrap(),
            temperature: 0.3,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["temperature"], 0.3);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("\"symbol\":\"AAA\""));
        assert!(user.contains("\"totalHolders\":null"));
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"id": "x", "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "{\"rankedCoins\": []}"}}
        ]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"{"rankedCoins": []}"#);
    }

    #[test]
    fn test_extract_content_no_choices() {
        assert!(matches!(
            extract_content(r#"{"choices": []}"#),
            Err(RankingError::Parse(_))
        ));
        assert!(matches!(extract_content("oops"), Err(RankingError::Parse(_))));
    }
}
