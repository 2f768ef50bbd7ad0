//! Scoring - Pure domain services over risk and opportunity scores.
//!
//! - `engine` - Weighted aggregation, level buckets, verdict rules
//! - `distribution` - Summary statistics of a score list
//! - `validator` - Non-fatal range and consistency checks

mod distribution;
mod engine;
mod validator;

pub use distribution::ScoreDistribution;
pub use engine::{
    OpportunityLevel, RiskLevel, ScoreSummary, ScoringEngine, ScoringError, CAUTION_RATIO,
    DEFAULT_LABEL_WEIGHT, LEVEL_BOUNDARIES, PROCEED_RATIO,
};
pub use validator::ScoreValidator;
