//! Scoring Engine - Deterministic aggregation of per-factor scores.
//!
//! Pure functions only. Given the same inputs every function returns the
//! same output, independent of input ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::schemas::{
    OpportunityOutput, OpportunityScore, RiskOutput, RiskScore, Verdict,
};

use super::distribution::{round2, ScoreDistribution};

/// Upper bounds of the lower four buckets. Anything at or above the last
/// boundary falls in the top bucket.
pub const LEVEL_BOUNDARIES: [f64; 4] = [2.5, 4.5, 6.5, 8.5];

/// Weight applied to an unrecognized severity or potential label.
pub const DEFAULT_LABEL_WEIGHT: f64 = 1.0;

/// Ratio at or above which the middle band recommends proceeding.
pub const PROCEED_RATIO: f64 = 1.5;

/// Ratio at or above which the middle band recommends caution.
pub const CAUTION_RATIO: f64 = 0.8;

/// Errors from scoring calculations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("Scores and weights must have same length ({scores} scores, {weights} weights)")]
    LengthMismatch { scores: usize, weights: usize },
}

/// Bucketed overall risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucketed overall opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityLevel {
    Minimal,
    Low,
    Medium,
    High,
    Transformative,
}

impl OpportunityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityLevel::Minimal => "minimal",
            OpportunityLevel::Low => "low",
            OpportunityLevel::Medium => "medium",
            OpportunityLevel::High => "high",
            OpportunityLevel::Transformative => "transformative",
        }
    }
}

impl fmt::Display for OpportunityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine derives from a pair of scoring outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub overall_risk: f64,
    pub overall_opportunity: f64,
    pub risk_level: RiskLevel,
    pub opportunity_level: OpportunityLevel,
    /// Opportunity over risk; infinite when risk is zero and opportunity isn't.
    pub risk_reward_ratio: f64,
    pub category: Verdict,
    pub risk_distribution: ScoreDistribution,
    pub opportunity_distribution: ScoreDistribution,
}

/// Deterministic scoring calculations.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Computes `Σ(score·weight) / Σ(weight)` rounded to two decimals.
    ///
    /// # Edge Cases
    /// - Empty scores: Returns 0
    /// - Total weight of 0: Returns 0
    ///
    /// # Errors
    /// `LengthMismatch` when the slices differ in length.
    pub fn weighted_average(scores: &[f64], weights: &[f64]) -> Result<f64, ScoringError> {
        if scores.len() != weights.len() {
            return Err(ScoringError::LengthMismatch {
                scores: scores.len(),
                weights: weights.len(),
            });
        }
        if scores.is_empty() {
            return Ok(0.0);
        }

        let total_weight: f64 = weights.iter().sum();
        if total_weight == 0.0 {
            return Ok(0.0);
        }

        let weighted_sum: f64 = scores.iter().zip(weights).map(|(s, w)| s * w).sum();
        Ok(round2(weighted_sum / total_weight))
    }

    /// Equal-weight average, rounded to two decimals.
    pub fn average(scores: &[f64]) -> f64 {
        let weights = vec![1.0; scores.len()];
        Self::weighted_average(scores, &weights).unwrap_or(0.0)
    }

    /// Severity-weighted average of per-factor risk scores.
    pub fn overall_risk(risk_scores: &[RiskScore]) -> f64 {
        let pairs = risk_scores
            .iter()
            .map(|r| {
                let weight = r
                    .severity_level()
                    .map_or(DEFAULT_LABEL_WEIGHT, |s| s.weight());
                (r.score, weight)
            })
            .collect();
        Self::aggregate(pairs)
    }

    /// Potential-weighted average of per-factor opportunity scores.
    pub fn overall_opportunity(opportunity_scores: &[OpportunityScore]) -> f64 {
        let pairs = opportunity_scores
            .iter()
            .map(|o| {
                let weight = o
                    .potential_level()
                    .map_or(DEFAULT_LABEL_WEIGHT, |p| p.weight());
                (o.score, weight)
            })
            .collect();
        Self::aggregate(pairs)
    }

    /// Sorting first makes the floating-point sum independent of input order.
    fn aggregate(mut pairs: Vec<(f64, f64)>) -> f64 {
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        let (scores, weights): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Self::weighted_average(&scores, &weights).unwrap_or(0.0)
    }

    /// Buckets a risk score. A value on a boundary takes the higher bucket.
    pub fn risk_level(score: f64) -> RiskLevel {
        match bucket(score) {
            0 => RiskLevel::Minimal,
            1 => RiskLevel::Low,
            2 => RiskLevel::Medium,
            3 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    /// Buckets an opportunity score. A value on a boundary takes the higher bucket.
    pub fn opportunity_level(score: f64) -> OpportunityLevel {
        match bucket(score) {
            0 => OpportunityLevel::Minimal,
            1 => OpportunityLevel::Low,
            2 => OpportunityLevel::Medium,
            3 => OpportunityLevel::High,
            _ => OpportunityLevel::Transformative,
        }
    }

    /// Opportunity divided by risk, rounded to two decimals.
    ///
    /// # Edge Cases
    /// - Risk 0, opportunity > 0: `f64::INFINITY`
    /// - Risk 0, opportunity 0: 0
    pub fn risk_reward_ratio(risk: f64, opportunity: f64) -> f64 {
        if risk == 0.0 {
            return if opportunity > 0.0 { f64::INFINITY } else { 0.0 };
        }
        round2(opportunity / risk)
    }

    /// Maps overall scores to a verdict.
    ///
    /// Rules are evaluated in order:
    /// 1. opportunity >= 7 and risk <= 4: Proceed
    /// 2. opportunity <= 4 and risk >= 7: Do Not Proceed
    /// 3. ratio >= 1.5: Proceed, ratio >= 0.8: Proceed with Caution, otherwise Do Not Proceed
    pub fn recommendation_category(risk: f64, opportunity: f64) -> Verdict {
        if opportunity >= 7.0 && risk <= 4.0 {
            return Verdict::Proceed;
        }
        if opportunity <= 4.0 && risk >= 7.0 {
            return Verdict::DoNotProceed;
        }

        let ratio = Self::risk_reward_ratio(risk, opportunity);
        if ratio >= PROCEED_RATIO {
            Verdict::Proceed
        } else if ratio >= CAUTION_RATIO {
            Verdict::ProceedWithCaution
        } else {
            Verdict::DoNotProceed
        }
    }

    /// Distribution statistics for a score list.
    pub fn score_distribution(scores: &[f64]) -> ScoreDistribution {
        ScoreDistribution::from_scores(scores)
    }

    /// Derives levels, ratio, verdict and distributions from the overall
    /// levels recorded on the two outputs.
    pub fn summarize(risk: &RiskOutput, opportunity: &OpportunityOutput) -> ScoreSummary {
        let overall_risk = risk.overall_risk_level;
        let overall_opportunity = opportunity.overall_opportunity_level;
        let risk_values: Vec<f64> = risk.risk_scores.iter().map(|r| r.score).collect();
        let opportunity_values: Vec<f64> = opportunity
            .opportunity_scores
            .iter()
            .map(|o| o.score)
            .collect();

        ScoreSummary {
            overall_risk,
            overall_opportunity,
            risk_level: Self::risk_level(overall_risk),
            opportunity_level: Self::opportunity_level(overall_opportunity),
            risk_reward_ratio: Self::risk_reward_ratio(overall_risk, overall_opportunity),
            category: Self::recommendation_category(overall_risk, overall_opportunity),
            risk_distribution: Self::score_distribution(&risk_values),
            opportunity_distribution: Self::score_distribution(&opportunity_values),
        }
    }
}

/// Index of the half-open bucket containing `score`.
fn bucket(score: f64) -> usize {
    LEVEL_BOUNDARIES
        .iter()
        .position(|boundary| score < *boundary)
        .unwrap_or(LEVEL_BOUNDARIES.len())
}
