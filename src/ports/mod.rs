//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data (listings, candles, holders)
//! - Push notifications
//! - Candidate ranking

pub mod market_data;
pub mod notification;
pub mod ranking;
pub mod mocks;

pub use market_data::{MarketDataError, MarketDataPort};
pub use notification::{AlertError, AlertSink};
pub use ranking::{CandidatePayload, RankedCoin, RankingError, RankingOutcome, RankingPort};
