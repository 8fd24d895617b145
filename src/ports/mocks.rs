//! Recording test doubles for the ports.
//!
//! Each mock records the calls it receives and answers from canned
//! responses, so pipeline tests can assert both outputs and call counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{AlertEvent, CandlestickSample, HolderSnapshot, InstrumentSnapshot};
use super::market_data::{MarketDataError, MarketDataPort};
use super::notification::{AlertError, AlertSink};
use super::ranking::{CandidatePayload, RankingError, RankingOutcome, RankingPort};

/// A call observed by [`MockMarketData`]
#[derive(Debug, Clone, PartialEq)]
pub enum MarketCall {
    Page(u32),
    Candles(String),
    Holders(String),
}

/// Mock market data port that records calls and allows controlled responses
#[derive(Debug, Default)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<MarketCall>>>,
    pages: Arc<Mutex<HashMap<u32, Vec<InstrumentSnapshot>>>>,
    page_failures: Arc<Mutex<HashMap<u32, usize>>>,
    candles: Arc<Mutex<HashMap<String, Result<Vec<CandlestickSample>, MarketDataError>>>>,
    holders: Arc<Mutex<HashMap<String, HolderSnapshot>>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the listings returned for a page
    pub fn with_page(self, page: u32, instruments: Vec<InstrumentSnapshot>) -> Self {
        self.pages.lock().unwrap().insert(page, instruments);
        self
    }

    /// Make the next `times` fetches of `page` fail with a transport error
    pub fn with_page_failure(self, page: u32, times: usize) -> Self {
        self.page_failures.lock().unwrap().insert(page, times);
        self
    }

    pub fn with_candles(self, symbol: &str, candles: Vec<CandlestickSample>) -> Self {
        self.candles.lock().unwrap().insert(symbol.to_string(), Ok(candles));
        self
    }

    pub fn with_candle_error(self, symbol: &str) -> Self {
        self.candles.lock().unwrap().insert(
            symbol.to_string(),
            Err(MarketDataError::Transport("candles unavailable".into())),
        );
        self
    }

    /// Symbols without holders configured answer with a transport error
    pub fn with_holders(self, symbol: &str, snapshot: HolderSnapshot) -> Self {
        self.holders.lock().unwrap().insert(symbol.to_string(), snapshot);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MarketCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded calls that concern `symbol`
    pub fn calls_for(&self, symbol: &str) -> Vec<MarketCall> {
        self.get_calls()
            .into_iter()
            .filter(|c| match c {
                MarketCall::Candles(s) | MarketCall::Holders(s) => s == symbol,
                MarketCall::Page(_) => false,
            })
            .collect()
    }

    pub fn page_calls(&self) -> Vec<u32> {
        self.get_calls()
            .into_iter()
            .filter_map(|c| match c {
                MarketCall::Page(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_page(
        &self,
        page: u32,
        _page_size: u32,
    ) -> Result<Vec<InstrumentSnapshot>, MarketDataError> {
        self.calls.lock().unwrap().push(MarketCall::Page(page));

        {
            let mut failures = self.page_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&page) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(MarketDataError::Transport(format!("page {} unavailable", page)));
                }
            }
        }

        Ok(self.pages.lock().unwrap().get(&page).cloned().unwrap_or_default())
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
    ) -> Result<Vec<CandlestickSample>, MarketDataError> {
        self.calls.lock().unwrap().push(MarketCall::Candles(symbol.to_string()));
        self.candles
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_holders(
        &self,
        symbol: &str,
        _limit: u32,
    ) -> Result<HolderSnapshot, MarketDataError> {
        self.calls.lock().unwrap().push(MarketCall::Holders(symbol.to_string()));
        self.holders
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| MarketDataError::Transport("No holders configured".to_string()))
    }
}

/// Mock alert sink that records deliveries and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<AlertEvent>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every delivery fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<AlertEvent> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_symbols(&self) -> Vec<String> {
        self.delivered().into_iter().map(|e| e.symbol).collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, event: &AlertEvent) -> Result<(), AlertError> {
        self.delivered.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(AlertError::Transport("sink offline".into()));
        }
        Ok(())
    }
}

/// Mock ranking port returning a fixed outcome
#[derive(Debug)]
pub struct MockRanker {
    outcome: RankingOutcome,
    requests: Arc<Mutex<Vec<Vec<CandidatePayload>>>>,
}

impl MockRanker {
    pub fn new(outcome: RankingOutcome) -> Self {
        Self {
            outcome,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<Vec<CandidatePayload>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RankingPort for MockRanker {
    async fn rank(&self, candidates: &[CandidatePayload]) -> Result<RankingOutcome, RankingError> {
        self.requests.lock().unwrap().push(candidates.to_vec());
        Ok(self.outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data() {
        let mock = MockMarketData::new().with_page_failure(2, 1);

        assert!(mock.fetch_page(2, 100).await.is_err());
        assert!(mock.fetch_page(2, 100).await.unwrap().is_empty());
        assert!(mock.fetch_candles("X", "1h").await.unwrap().is_empty());
        assert!(mock.fetch_holders("X", 50).await.is_err());

        assert_eq!(mock.page_calls(), vec![2, 2]);
        assert_eq!(mock.calls_for("X").len(), 2);
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::failing();
        let result = sink.deliver(&AlertEvent::routine("X", "msg")).await;
        assert!(result.is_err());
        assert_eq!(sink.delivered_symbols(), vec!["X".to_string()]);
    }
}
