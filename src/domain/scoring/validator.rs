//! Range and consistency checks over scoring outputs.
//!
//! Nothing here fails: every check returns a list of human-readable messages
//! (empty when clean) and the caller decides how loud to be about them.

use std::collections::BTreeSet;

use crate::domain::schemas::{
    OpportunityOutput, Potential, RiskOutput, Severity, MAX_SCORE, MIN_SCORE,
};

/// Validates scoring outputs.
pub struct ScoreValidator;

impl ScoreValidator {
    /// True when `min <= score <= max`. NaN is never in range.
    pub fn validate_score_range(score: f64, min: f64, max: f64) -> bool {
        (min..=max).contains(&score)
    }

    fn in_score_range(score: f64) -> bool {
        Self::validate_score_range(score, MIN_SCORE, MAX_SCORE)
    }

    /// Checks overall level, per-factor scores and severity labels.
    pub fn validate_risk_output(output: &RiskOutput) -> Vec<String> {
        let mut errors = Vec::new();

        if !Self::in_score_range(output.overall_risk_level) {
            errors.push(format!(
                "Overall risk level {} out of range",
                output.overall_risk_level
            ));
        }

        for score in &output.risk_scores {
            if !Self::in_score_range(score.score) {
                errors.push(format!(
                    "Risk score for {} ({}) out of range",
                    score.factor_name, score.score
                ));
            }
            if Severity::from_label(&score.severity).is_none() {
                errors.push(format!(
                    "Invalid severity '{}' for {}",
                    score.severity, score.factor_name
                ));
            }
        }

        errors
    }

    /// Checks overall level, per-factor scores and potential labels.
    pub fn validate_opportunity_output(output: &OpportunityOutput) -> Vec<String> {
        let mut errors = Vec::new();

        if !Self::in_score_range(output.overall_opportunity_level) {
            errors.push(format!(
                "Overall opportunity level {} out of range",
                output.overall_opportunity_level
            ));
        }

        for score in &output.opportunity_scores {
            if !Self::in_score_range(score.score) {
                errors.push(format!(
                    "Opportunity score for {} ({}) out of range",
                    score.factor_name, score.score
                ));
            }
            if Potential::from_label(&score.potential).is_none() {
                errors.push(format!(
                    "Invalid potential '{}' for {}",
                    score.potential, score.factor_name
                ));
            }
        }

        errors
    }

    /// Reports factors scored by one step but not the other.
    ///
    /// Names are compared exactly and listed in sorted order.
    pub fn validate_consistency(risk: &RiskOutput, opportunity: &OpportunityOutput) -> Vec<String> {
        let risk_factors: BTreeSet<&str> = risk
            .risk_scores
            .iter()
            .map(|r| r.factor_name.as_str())
            .collect();
        let opportunity_factors: BTreeSet<&str> = opportunity
            .opportunity_scores
            .iter()
            .map(|o| o.factor_name.as_str())
            .collect();

        let mut warnings = Vec::new();

        let missing_in_risk: Vec<&str> = opportunity_factors
            .difference(&risk_factors)
            .copied()
            .collect();
        if !missing_in_risk.is_empty() {
            warnings.push(format!(
                "Factors in opportunity but not risk: {}",
                missing_in_risk.join(", ")
            ));
        }

        let missing_in_opportunity: Vec<&str> = risk_factors
            .difference(&opportunity_factors)
            .copied()
            .collect();
        if !missing_in_opportunity.is_empty() {
            warnings.push(format!(
                "Factors in risk but not opportunity: {}",
                missing_in_opportunity.join(", ")
            ));
        }

        warnings
    }
}
