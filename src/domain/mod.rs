//! Domain Layer - Core types for the rugwatch screener
//!
//! This module contains pure domain types and logic with no I/O.
//! All external interactions happen through the ports layer.
//!
//! - `instrument`: listing snapshots and price candles
//! - `holders`: holder snapshots and concentration analysis
//! - `key_rotator`: round-robin API credential pool
//! - `alert`: alert events and severity

pub mod instrument;
pub mod holders;
pub mod key_rotator;
pub mod alert;

pub use instrument::{InstrumentSnapshot, CandlestickSample};
pub use holders::{HolderEntry, HolderSnapshot, HolderAnalysis};
pub use key_rotator::{KeyRotator, KeyPoolError};
pub use alert::{AlertEvent, Severity};
