//! Intraday Momentum Reading
//!
//! Net move across a candle window plus the window's lowest print. A window
//! only counts as supported momentum when price never traded below the
//! opening print, which screens out pump-and-dump wicks.

use crate::domain::CandlestickSample;

/// Which momentum rule a reading failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentumShortfall {
    DippedBelowOpen,
    InsufficientGain,
}

/// Summary of a chronological candle window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumReading {
    pub open: f64,
    pub close: f64,
    pub lowest_low: f64,
    /// Fractional gain from first open to last close (0.5 = +50%)
    pub gain: f64,
}

impl MomentumReading {
    /// Returns `None` when the window is inconclusive: no samples, or a
    /// non-positive opening print that makes the gain undefined.
    pub fn from_candles(candles: &[CandlestickSample]) -> Option<Self> {
        let first = candles.first()?;
        let last = candles.last()?;

        let open = first.open;
        if !(open > 0.0) {
            return None;
        }

        let lowest_low = candles
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min);

        Some(Self {
            open,
            close: last.close,
            lowest_low,
            gain: (last.close - open) / open,
        })
    }

    pub fn held_above_open(&self) -> bool {
        self.lowest_low >= self.open
    }

    /// Gain when the window held its open and reached `min_gain`,
    /// otherwise the first rule that failed
    pub fn check(&self, min_gain: f64) -> Result<f64, MomentumShortfall> {
        if !self.held_above_open() {
            return Err(MomentumShortfall::DippedBelowOpen);
        }
        if self.gain < min_gain {
            return Err(MomentumShortfall::InsufficientGain);
        }
        Ok(self.gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn candle(open: f64, close: f64, low: f64, high: f64, minute: u32) -> CandlestickSample {
        CandlestickSample {
            open,
            close,
            low,
            high,
            time: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_window_is_inconclusive() {
        assert!(MomentumReading::from_candles(&[]).is_none());
    }

    #[test]
    fn test_zero_open_is_inconclusive() {
        let candles = [candle(0.0, 1.0, 0.0, 1.0, 0)];
        assert!(MomentumReading::from_candles(&candles).is_none());
    }

    #[test]
    fn test_steady_rise() {
        let candles = [
            candle(1.0, 1.2, 1.0, 1.25, 0),
            candle(1.2, 1.5, 1.15, 1.55, 15),
            candle(1.5, 1.8, 1.45, 1.9, 30),
        ];
        let reading = MomentumReading::from_candles(&candles).unwrap();
        assert_relative_eq!(reading.gain, 0.8, epsilon = 1e-12);
        assert_eq!(reading.lowest_low, 1.0);
        assert!(reading.held_above_open());
        assert_eq!(reading.check(0.9), Err(MomentumShortfall::InsufficientGain));
        assert_relative_eq!(reading.check(0.5).unwrap(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_wick_below_open_fails_despite_gain() {
        let candles = [
            candle(1.0, 0.9, 0.6, 1.0, 0),
            candle(0.9, 2.0, 0.85, 2.1, 30),
        ];
        let reading = MomentumReading::from_candles(&candles).unwrap();
        assert_relative_eq!(reading.gain, 1.0, epsilon = 1e-12);
        assert!(!reading.held_above_open());
        assert_eq!(reading.check(0.5), Err(MomentumShortfall::DippedBelowOpen));
    }
}
