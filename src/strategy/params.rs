//! Filter Profile Parameters
//!
//! One parameter structure drives the candidate pipeline for both entry
//! points. The two named profiles reproduce the thresholds each entry point
//! has always used:
//! - `interactive`: on-demand scans from the command surface
//! - `unattended`: the scheduled background scanner

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Holder count below which no instrument can become a candidate
pub const MIN_DIVERSITY_HOLDERS: u64 = 5;

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("max_age_hours must be > 0, got {0}")]
    InvalidMaxAge(u64),

    #[error("min_price must be >= 0, got {0}")]
    InvalidMinPrice(f64),

    #[error("momentum threshold must be finite, got {0}")]
    InvalidMomentum(f64),

    #[error("holder threshold must be >= {MIN_DIVERSITY_HOLDERS}, got {0}")]
    InvalidMinHolders(u64),

    #[error("max_top_holder_pct must be within 0-100, got {0}")]
    InvalidTopHolderPct(f64),
}

/// Whether an instrument exactly at the age limit still qualifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeBound {
    /// Reject only when `age > max_age`
    Inclusive,
    /// Reject when `age >= max_age`
    Exclusive,
}

/// How short-term momentum is measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MomentumRule {
    /// Intraday candles: gain from first open to last close, with no low
    /// below the first open anywhere in the window
    Candles { min_gain: f64 },
    /// The listing's own 24h change field, in percent
    Change24h { min_percent: f64 },
}

/// Holder-distribution requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiversityRule {
    /// Enough holders and no single dominant holder
    Concentration {
        min_holders: u64,
        max_top_holder_pct: f64,
    },
    /// Enough holders, a full holder list, and non-uniform quantities
    /// (identical quantities everywhere is an airdrop farm)
    Distributed { min_holders: u64 },
}

impl DiversityRule {
    pub fn min_holders(&self) -> u64 {
        match *self {
            DiversityRule::Concentration { min_holders, .. } => min_holders,
            DiversityRule::Distributed { min_holders } => min_holders,
        }
    }
}

/// What a stage does when its data could not be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Fail open: treat the stage as passed
    PassThrough,
    /// Fail closed: reject the instrument
    Reject,
}

/// Thresholds and policies for one run of the candidate pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterProfile {
    pub max_age_hours: u64,
    pub age_bound: AgeBound,
    pub min_price: f64,
    pub momentum: MomentumRule,
    pub diversity: DiversityRule,
    pub on_missing_holders: MissingDataPolicy,
}

impl FilterProfile {
    /// On-demand scan profile: under a week old, price >= 0.0001,
    /// 50% candle gain, at least 5 holders with top holder <= 80%,
    /// missing holder data passes.
    pub fn interactive() -> Self {
        Self {
            max_age_hours: 7 * 24,
            age_bound: AgeBound::Exclusive,
            min_price: 0.0001,
            momentum: MomentumRule::Candles { min_gain: 0.5 },
            diversity: DiversityRule::Concentration {
                min_holders: MIN_DIVERSITY_HOLDERS,
                max_top_holder_pct: 80.0,
            },
            on_missing_holders: MissingDataPolicy::PassThrough,
        }
    }

    /// Background scanner profile: at most 24h old, price >= 0.005,
    /// 24h change >= 75%, 20+ holders with varied quantities,
    /// missing holder data rejects.
    pub fn unattended() -> Self {
        Self {
            max_age_hours: 24,
            age_bound: AgeBound::Inclusive,
            min_price: 0.005,
            momentum: MomentumRule::Change24h { min_percent: 75.0 },
            diversity: DiversityRule::Distributed { min_holders: 20 },
            on_missing_holders: MissingDataPolicy::Reject,
        }
    }

    pub fn with_min_price(mut self, min_price: f64) -> Self {
        self.min_price = min_price;
        self
    }

    /// Override the momentum threshold, keeping the profile's measurement.
    /// `min_gain` is a fraction (0.5 = +50%).
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.momentum = match self.momentum {
            MomentumRule::Candles { .. } => MomentumRule::Candles { min_gain },
            MomentumRule::Change24h { .. } => MomentumRule::Change24h {
                min_percent: min_gain * 100.0,
            },
        };
        self
    }

    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.max_age_hours == 0 {
            return Err(ProfileError::InvalidMaxAge(self.max_age_hours));
        }
        if !(self.min_price >= 0.0) || !self.min_price.is_finite() {
            return Err(ProfileError::InvalidMinPrice(self.min_price));
        }

        let threshold = match self.momentum {
            MomentumRule::Candles { min_gain } => min_gain,
            MomentumRule::Change24h { min_percent } => min_percent,
        };
        if !threshold.is_finite() {
            return Err(ProfileError::InvalidMomentum(threshold));
        }

        let min_holders = self.diversity.min_holders();
        if min_holders < MIN_DIVERSITY_HOLDERS {
            return Err(ProfileError::InvalidMinHolders(min_holders));
        }
        if let DiversityRule::Concentration { max_top_holder_pct, .. } = self.diversity {
            if !(0.0..=100.0).contains(&max_top_holder_pct) {
                return Err(ProfileError::InvalidTopHolderPct(max_top_holder_pct));
            }
        }

        Ok(())
    }
}
