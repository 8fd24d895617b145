//! Strategy Layer - Candidate screening
//!
//! Decides which freshly listed instruments are worth an alert:
//! - Named filter profiles (interactive, unattended)
//! - Candle momentum with an open-price floor
//! - Ordered four-stage candidate pipeline with short-circuit evaluation

pub mod params;
pub mod momentum;
pub mod candidate_filter;

pub use params::{
    AgeBound, DiversityRule, FilterProfile, MissingDataPolicy, MomentumRule, ProfileError,
};
pub use momentum::{MomentumReading, MomentumShortfall};
pub use candidate_filter::{Candidate, CandidateFilter, DiversityVerdict, Rejection, Stage};
