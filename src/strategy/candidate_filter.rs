//! Candidate Filter
//!
//! Four-stage eligibility pipeline evaluated in a fixed order, stopping at
//! the first failing stage:
//!
//! 1. Age (no I/O)
//! 2. Price floor (no I/O)
//! 3. Momentum (candle fetch, unless the profile reads the 24h change)
//! 4. Holder diversity (holder fetch)
//!
//! Each stage is strictly more expensive than the one before, so cheap
//! rejections never trigger network calls. Enrichment failures are resolved
//! inside the stage per the profile's policy; evaluation itself never fails.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::domain::{HolderAnalysis, InstrumentSnapshot};
use crate::ports::MarketDataPort;
use super::momentum::{MomentumReading, MomentumShortfall};
use super::params::{AgeBound, DiversityRule, FilterProfile, MissingDataPolicy, MomentumRule};

/// Default candle timeframe for the momentum stage
pub const DEFAULT_TIMEFRAME: &str = "1h";

/// Default number of holders requested for the diversity stage
pub const DEFAULT_HOLDER_LIMIT: u32 = 50;

/// Pipeline stage, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Age,
    PriceFloor,
    Momentum,
    HolderDiversity,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Age => write!(f, "age"),
            Stage::PriceFloor => write!(f, "price"),
            Stage::Momentum => write!(f, "momentum"),
            Stage::HolderDiversity => write!(f, "holders"),
        }
    }
}

/// Why an instrument was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("listed {age_hours:.1}h ago, limit {max_hours}h")]
    TooOld { age_hours: f64, max_hours: u64 },

    #[error("price {price} below floor {min_price}")]
    BelowPriceFloor { price: f64, min_price: f64 },

    #[error("no candle data")]
    NoCandles,

    #[error("opening price not positive, gain undefined")]
    UndefinedGain,

    #[error("candles unavailable: {0}")]
    CandlesUnavailable(String),

    #[error("low {lowest_low} dipped below open {open}")]
    DippedBelowOpen { lowest_low: f64, open: f64 },

    #[error("gain {gain:.2} below {min_gain:.2}")]
    InsufficientGain { gain: f64, min_gain: f64 },

    #[error("24h change {change:.2}% below {min_percent:.2}%")]
    InsufficientChange { change: f64, min_percent: f64 },

    #[error("holders unavailable: {0}")]
    HoldersUnavailable(String),

    #[error("only {total} holders (<{min})")]
    TooFewHolders { total: u64, min: u64 },

    #[error("only {listed} holders listed (<{min})")]
    TooFewListedHolders { listed: usize, min: u64 },

    #[error("holder list empty")]
    NoHolderBreakdown,

    #[error("top holder holds {pct:.2}% (>{max:.0}%)")]
    TopHolderTooLarge { pct: f64, max: f64 },

    #[error("every holder holds the same quantity")]
    UniformQuantities,
}

impl Rejection {
    pub fn stage(&self) -> Stage {
        match self {
            Rejection::TooOld { .. } => Stage::Age,
            Rejection::BelowPriceFloor { .. } => Stage::PriceFloor,
            Rejection::NoCandles
            | Rejection::UndefinedGain
            | Rejection::CandlesUnavailable(_)
            | Rejection::DippedBelowOpen { .. }
            | Rejection::InsufficientGain { .. }
            | Rejection::InsufficientChange { .. } => Stage::Momentum,
            Rejection::HoldersUnavailable(_)
            | Rejection::TooFewHolders { .. }
            | Rejection::TooFewListedHolders { .. }
            | Rejection::NoHolderBreakdown
            | Rejection::TopHolderTooLarge { .. }
            | Rejection::UniformQuantities => Stage::HolderDiversity,
        }
    }
}

/// Outcome of the holder-diversity stage for a passing instrument
#[derive(Debug, Clone, PartialEq)]
pub enum DiversityVerdict {
    /// Holder data was checked and satisfied the rule
    Diverse {
        total_holders: u64,
        top_holder_pct: f64,
    },
    /// Holder data was unavailable and the profile fails open
    Unverified,
}

impl fmt::Display for DiversityVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiversityVerdict::Diverse { total_holders, top_holder_pct } => write!(
                f,
                "{} holders, top holder {:.2}%",
                total_holders, top_holder_pct
            ),
            DiversityVerdict::Unverified => write!(f, "holder data unavailable"),
        }
    }
}

/// An instrument that passed every stage
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub instrument: InstrumentSnapshot,
    /// Fractional momentum gain measured by stage 3
    pub gain: f64,
    pub diversity: DiversityVerdict,
}

impl Candidate {
    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }
}

/// Ordered, short-circuiting candidate pipeline
pub struct CandidateFilter {
    market: Arc<dyn MarketDataPort>,
    profile: FilterProfile,
    timeframe: String,
    holder_limit: u32,
}

impl CandidateFilter {
    pub fn new(market: Arc<dyn MarketDataPort>, profile: FilterProfile) -> Self {
        Self {
            market,
            profile,
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            holder_limit: DEFAULT_HOLDER_LIMIT,
        }
    }

    pub fn with_timeframe(mut self, timeframe: impl Into<String>) -> Self {
        self.timeframe = timeframe.into();
        self
    }

    pub fn with_holder_limit(mut self, limit: u32) -> Self {
        self.holder_limit = limit;
        self
    }

    pub fn profile(&self) -> &FilterProfile {
        &self.profile
    }

    /// Run every instrument through the pipeline, keeping survivors in
    /// their original order. One instrument's outcome never affects another.
    pub async fn filter(&self, instruments: &[InstrumentSnapshot], now: DateTime<Utc>) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for instrument in instruments {
            match self.evaluate(instrument, now).await {
                Ok(candidate) => {
                    tracing::info!(
                        "{} passed all stages (gain {:.2}, {})",
                        candidate.symbol(),
                        candidate.gain,
                        candidate.diversity
                    );
                    candidates.push(candidate);
                }
                Err(rejection) => {
                    tracing::debug!(
                        "Skipping {}: {} stage - {}",
                        instrument.symbol,
                        rejection.stage(),
                        rejection
                    );
                }
            }
        }

        tracing::info!(
            "{} of {} instruments passed filtering",
            candidates.len(),
            instruments.len()
        );
        candidates
    }

    /// Evaluate one instrument, stopping at the first failing stage
    pub async fn evaluate(
        &self,
        instrument: &InstrumentSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Candidate, Rejection> {
        self.check_age(instrument, now)?;
        self.check_price(instrument)?;
        let gain = self.check_momentum(instrument).await?;
        let diversity = self.check_holders(&instrument.symbol).await?;

        Ok(Candidate {
            instrument: instrument.clone(),
            gain,
            diversity,
        })
    }

    fn check_age(&self, instrument: &InstrumentSnapshot, now: DateTime<Utc>) -> Result<(), Rejection> {
        let age = instrument.age_at(now);
        let max = Duration::hours(self.profile.max_age_hours as i64);

        let too_old = match self.profile.age_bound {
            AgeBound::Inclusive => age > max,
            AgeBound::Exclusive => age >= max,
        };

        if too_old {
            return Err(Rejection::TooOld {
                age_hours: instrument.age_hours_at(now),
                max_hours: self.profile.max_age_hours,
            });
        }
        Ok(())
    }

    fn check_price(&self, instrument: &InstrumentSnapshot) -> Result<(), Rejection> {
        if instrument.current_price < self.profile.min_price {
            return Err(Rejection::BelowPriceFloor {
                price: instrument.current_price,
                min_price: self.profile.min_price,
            });
        }
        Ok(())
    }

    async fn check_momentum(&self, instrument: &InstrumentSnapshot) -> Result<f64, Rejection> {
        match self.profile.momentum {
            MomentumRule::Change24h { min_percent } => {
                if instrument.change_24h < min_percent {
                    return Err(Rejection::InsufficientChange {
                        change: instrument.change_24h,
                        min_percent,
                    });
                }
                Ok(instrument.change_24h / 100.0)
            }
            MomentumRule::Candles { min_gain } => {
                let candles = self
                    .market
                    .fetch_candles(&instrument.symbol, &self.timeframe)
                    .await
                    .map_err(|e| Rejection::CandlesUnavailable(e.to_string()))?;

                if candles.is_empty() {
                    return Err(Rejection::NoCandles);
                }

                let reading = MomentumReading::from_candles(&candles).ok_or(Rejection::UndefinedGain)?;

                reading.check(min_gain).map_err(|shortfall| match shortfall {
                    MomentumShortfall::DippedBelowOpen => Rejection::DippedBelowOpen {
                        lowest_low: reading.lowest_low,
                        open: reading.open,
                    },
                    MomentumShortfall::InsufficientGain => Rejection::InsufficientGain {
                        gain: reading.gain,
                        min_gain,
                    },
                })
            }
        }
    }

    async fn check_holders(&self, symbol: &str) -> Result<DiversityVerdict, Rejection> {
        let snapshot = match self.market.fetch_holders(symbol, self.holder_limit).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return match self.profile.on_missing_holders {
                    MissingDataPolicy::PassThrough => {
                        tracing::info!("No holder data for {} ({}), including by default", symbol, e);
                        Ok(DiversityVerdict::Unverified)
                    }
                    MissingDataPolicy::Reject => Err(Rejection::HoldersUnavailable(e.to_string())),
                };
            }
        };

        let analysis = HolderAnalysis::of(&snapshot);
        apply_diversity_rule(&self.profile.diversity, &analysis)?;

        Ok(DiversityVerdict::Diverse {
            total_holders: analysis.total_holders,
            top_holder_pct: analysis.top_holder_percentage,
        })
    }
}

fn apply_diversity_rule(rule: &DiversityRule, analysis: &HolderAnalysis) -> Result<(), Rejection> {
    match *rule {
        DiversityRule::Concentration { min_holders, max_top_holder_pct } => {
            if analysis.total_holders < min_holders {
                return Err(Rejection::TooFewHolders {
                    total: analysis.total_holders,
                    min: min_holders,
                });
            }
            if analysis.listed_holders == 0 {
                return Err(Rejection::NoHolderBreakdown);
            }
            if analysis.top_holder_percentage > max_top_holder_pct {
                return Err(Rejection::TopHolderTooLarge {
                    pct: analysis.top_holder_percentage,
                    max: max_top_holder_pct,
                });
            }
        }
        DiversityRule::Distributed { min_holders } => {
            if analysis.total_holders < min_holders {
                return Err(Rejection::TooFewHolders {
                    total: analysis.total_holders,
                    min: min_holders,
                });
            }
            if (analysis.listed_holders as u64) < min_holders {
                return Err(Rejection::TooFewListedHolders {
                    listed: analysis.listed_holders,
                    min: min_holders,
                });
            }
            if analysis.all_equal {
                return Err(Rejection::UniformQuantities);
            }
        }
    }
    Ok(())
}
