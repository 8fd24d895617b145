//! Rugplay API wire types
//!
//! Response bodies for `/market`, `/coin/{symbol}` and `/holders/{symbol}`,
//! plus the decoding into domain types.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{CandlestickSample, HolderEntry, HolderSnapshot, InstrumentSnapshot};
use crate::ports::MarketDataError;

/// Unix timestamps above this are taken to be milliseconds
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// `GET /market` response
#[derive(Debug, Deserialize)]
pub struct MarketResponse {
    /// Kept untyped so one malformed listing does not sink the page
    #[serde(default)]
    pub coins: Vec<Value>,
}

/// `GET /coin/{symbol}` response (only the candle series is used)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinResponse {
    #[serde(default)]
    pub candlestick_data: Vec<WireCandle>,
}

#[derive(Debug, Deserialize)]
pub struct WireCandle {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    pub time: WireTime,
}

/// Candle time as sent by the API: Unix seconds/millis or an RFC 3339 string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireTime {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl WireTime {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            WireTime::Integer(ts) => from_unix(*ts),
            WireTime::Float(ts) => from_unix(ts.trunc() as i64),
            WireTime::Text(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
        }
    }
}

fn from_unix(ts: i64) -> Option<DateTime<Utc>> {
    if ts.abs() >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(ts).single()
    } else {
        Utc.timestamp_opt(ts, 0).single()
    }
}

/// `GET /holders/{symbol}` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldersResponse {
    #[serde(default)]
    pub total_holders: u64,
    #[serde(default)]
    pub holders: Vec<WireHolder>,
}

#[derive(Debug, Deserialize)]
pub struct WireHolder {
    #[serde(default)]
    pub address: String,
    pub quantity: f64,
    pub percentage: f64,
}

/// Decode a market page, dropping listings that fail to decode
pub fn parse_market_page(body: &str) -> Result<Vec<InstrumentSnapshot>, MarketDataError> {
    let response: MarketResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    let mut instruments = Vec::with_capacity(response.coins.len());
    for raw in response.coins {
        let symbol = raw
            .get("symbol")
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string();

        match serde_json::from_value::<InstrumentSnapshot>(raw) {
            Ok(instrument) => instruments.push(instrument),
            Err(e) => tracing::warn!("Skipping malformed listing {}: {}", symbol, e),
        }
    }

    Ok(instruments)
}

/// Decode a candle series. A sample with an unreadable time fails the
/// whole series, since dropping it would shift the window's first open.
pub fn parse_candles(body: &str) -> Result<Vec<CandlestickSample>, MarketDataError> {
    let response: CoinResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    response
        .candlestick_data
        .into_iter()
        .map(|c| {
            let time = c.time.to_datetime().ok_or_else(|| {
                MarketDataError::Parse(format!("unreadable candle time {:?}", c.time))
            })?;
            Ok(CandlestickSample {
                open: c.open,
                close: c.close,
                low: c.low,
                high: c.high,
                time,
            })
        })
        .collect()
}

pub fn parse_holders(body: &str) -> Result<HolderSnapshot, MarketDataError> {
    let response: HoldersResponse =
        serde_json::from_str(body).map_err(|e| MarketDataError::Parse(e.to_string()))?;

    let holders = response
        .holders
        .into_iter()
        .map(|h| HolderEntry {
            address: h.address,
            quantity: h.quantity,
            percentage: h.percentage,
        })
        .collect();

    Ok(HolderSnapshot::new(response.total_holders, holders))
}
