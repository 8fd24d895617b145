use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A newly listed coin as returned by one market page poll.
///
/// Snapshots are never mutated; every poll fetches a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "change24h", default)]
    pub change_24h: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl InstrumentSnapshot {
    /// Time elapsed since listing, never negative
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        let age = now - self.created_at;
        if age < Duration::zero() {
            Duration::zero()
        } else {
            age
        }
    }

    /// Age in fractional hours
    pub fn age_hours_at(&self, now: DateTime<Utc>) -> f64 {
        self.age_at(now).num_seconds() as f64 / 3600.0
    }
}

/// One OHLC bar for an instrument
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandlestickSample {
    pub open: f64,
    pub close: f64,
    pub low: f64,
    pub high: f64,
    pub time: DateTime<Utc>,
}
