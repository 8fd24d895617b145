//! Rugplay Adapter
//!
//! Implementation of the MarketDataPort for the Rugplay market API.
//! Handles listing pages, candle series and holder snapshots.

mod client;
mod types;

pub use client::{RugplayClient, RugplayConfig};
pub use types::{parse_candles, parse_holders, parse_market_page};
