use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CandlestickSample, HolderSnapshot, InstrumentSnapshot};

/// Market data error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Data parsing error: {0}")]
    Parse(String),
}

/// Market data port trait
///
/// Every call is independent; implementations draw a fresh credential per
/// request.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch one page of listings, newest first
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<InstrumentSnapshot>, MarketDataError>;

    /// Fetch price candles for a symbol.
    /// An empty vector means the upstream has no data, which callers must
    /// treat as inconclusive rather than as zero movement.
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Vec<CandlestickSample>, MarketDataError>;

    /// Fetch the top `limit` holders of a symbol.
    /// Callers decide what an `Err` means for them (pass or reject).
    async fn fetch_holders(
        &self,
        symbol: &str,
        limit: u32,
    ) -> Result<HolderSnapshot, MarketDataError>;
}
