//! Per-factor risk and opportunity scoring.
//!
//! Severity and potential labels travel as free strings so that an unknown
//! label from the backend survives deserialization and can be reported by
//! the score validator instead of failing the whole step.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{require_in_range, ValidationError};

use super::structured::{FieldType, OutputSchema, SchemaField, StructuredOutput};

/// Lowest valid factor or overall score.
pub const MIN_SCORE: f64 = 0.0;

/// Highest valid factor or overall score.
pub const MAX_SCORE: f64 = 10.0;

/// Severity of a factor's risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Parses a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|s| s.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Aggregation weight.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 1.5,
            Severity::High => 2.0,
            Severity::Critical => 3.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Potential of a factor's opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Potential {
    Low,
    Medium,
    High,
    Transformative,
}

impl Potential {
    pub const ALL: [Potential; 4] = [
        Potential::Low,
        Potential::Medium,
        Potential::High,
        Potential::Transformative,
    ];

    /// Parses a label case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == normalized)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Potential::Low => "low",
            Potential::Medium => "medium",
            Potential::High => "high",
            Potential::Transformative => "transformative",
        }
    }

    /// Aggregation weight.
    pub fn weight(&self) -> f64 {
        match self {
            Potential::Low => 1.0,
            Potential::Medium => 1.5,
            Potential::High => 2.0,
            Potential::Transformative => 3.0,
        }
    }
}

impl fmt::Display for Potential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn labels<T: Copy>(all: &[T], as_str: fn(&T) -> &'static str) -> Vec<String> {
    all.iter().map(|v| as_str(v).to_string()).collect()
}

/// Risk assessment for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub factor_name: String,
    /// Score in `[0, 10]`.
    pub score: f64,
    pub reasoning: String,
    /// Expected: low, medium, high, critical.
    pub severity: String,
}

impl RiskScore {
    /// Parsed severity, `None` for an unrecognized label.
    pub fn severity_level(&self) -> Option<Severity> {
        Severity::from_label(&self.severity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_in_range("score", self.score, MIN_SCORE, MAX_SCORE)
    }
}

/// Output of the risk step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskOutput {
    pub risk_scores: Vec<RiskScore>,
    pub overall_risk_level: f64,
    pub risk_summary: String,
}

impl StructuredOutput for RiskOutput {
    fn output_schema() -> OutputSchema {
        OutputSchema::new(
            "RiskOutput",
            "Risk assessment for each evaluation factor",
            vec![
                SchemaField::required(
                    "risk_scores",
                    FieldType::Array(Box::new(FieldType::Object(vec![
                        SchemaField::required("factor_name", FieldType::String, "Factor name"),
                        SchemaField::required("score", FieldType::Number, "Risk score 0-10")
                            .with_range(MIN_SCORE, MAX_SCORE),
                        SchemaField::required(
                            "reasoning",
                            FieldType::String,
                            "Why this score was assigned",
                        ),
                        SchemaField::required(
                            "severity",
                            FieldType::Enum(labels(&Severity::ALL, Severity::as_str)),
                            "low, medium, high, critical",
                        ),
                    ]))),
                    "Risk scores per factor",
                ),
                SchemaField::required(
                    "overall_risk_level",
                    FieldType::Number,
                    "Overall risk level 0-10",
                )
                .with_range(MIN_SCORE, MAX_SCORE),
                SchemaField::required("risk_summary", FieldType::String, "Summary of key risks"),
            ],
        )
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (i, score) in self.risk_scores.iter().enumerate() {
            score
                .validate()
                .map_err(|e| e.within(format!("risk_scores[{}]", i)))?;
        }
        require_in_range(
            "overall_risk_level",
            self.overall_risk_level,
            MIN_SCORE,
            MAX_SCORE,
        )
    }
}

/// Opportunity assessment for one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub factor_name: String,
    /// Score in `[0, 10]`.
    pub score: f64,
    pub reasoning: String,
    /// Expected: low, medium, high, transformative.
    pub potential: String,
}

impl OpportunityScore {
    /// Parsed potential, `None` for an unrecognized label.
    pub fn potential_level(&self) -> Option<Potential> {
        Potential::from_label(&self.potential)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_in_range("score", self.score, MIN_SCORE, MAX_SCORE)
    }
}

/// Output of the opportunity step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityOutput {
    pub opportunity_scores: Vec<OpportunityScore>,
    pub overall_opportunity_level: f64,
    pub opportunity_summary: String,
}

impl StructuredOutput for OpportunityOutput {
    fn output_schema() -> OutputSchema {
        OutputSchema::new(
            "OpportunityOutput",
            "Opportunity assessment for each evaluation factor",
            vec![
                SchemaField::required(
                    "opportunity_scores",
                    FieldType::Array(Box::new(FieldType::Object(vec![
                        SchemaField::required("factor_name", FieldType::String, "Factor name"),
                        SchemaField::required("score", FieldType::Number, "Opportunity score 0-10")
                            .with_range(MIN_SCORE, MAX_SCORE),
                        SchemaField::required(
                            "reasoning",
                            FieldType::String,
                            "Why this score was assigned",
                        ),
                        SchemaField::required(
                            "potential",
                            FieldType::Enum(labels(&Potential::ALL, Potential::as_str)),
                            "low, medium, high, transformative",
                        ),
                    ]))),
                    "Opportunity scores per factor",
                ),
                SchemaField::required(
                    "overall_opportunity_level",
                    FieldType::Number,
                    "Overall opportunity level 0-10",
                )
                .with_range(MIN_SCORE, MAX_SCORE),
                SchemaField::required(
                    "opportunity_summary",
                    FieldType::String,
                    "Summary of key opportunities",
                ),
            ],
        )
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for (i, score) in self.opportunity_scores.iter().enumerate() {
            score
                .validate()
                .map_err(|e| e.within(format!("opportunity_scores[{}]", i)))?;
        }
        require_in_range(
            "overall_opportunity_level",
            self.overall_opportunity_level,
            MIN_SCORE,
            MAX_SCORE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(name: &str, score: f64, severity: &str) -> RiskScore {
        RiskScore {
            factor_name: name.to_string(),
            score,
            reasoning: "Because".to_string(),
            severity: severity.to_string(),
        }
    }

    #[test]
    fn severity_parses_case_insensitively() {
        assert_eq!(Severity::from_label("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_label(" critical "), Some(Severity::Critical));
        assert_eq!(Severity::from_label("severe"), None);
    }

    #[test]
    fn weights_follow_label_order() {
        assert_eq!(Severity::Low.weight(), 1.0);
        assert_eq!(Severity::Medium.weight(), 1.5);
        assert_eq!(Severity::High.weight(), 2.0);
        assert_eq!(Severity::Critical.weight(), 3.0);
        assert_eq!(Potential::Transformative.weight(), 3.0);
    }

    #[test]
    fn unknown_severity_survives_deserialization() {
        let json = r#"{
            "risk_scores": [{"factor_name": "Salary", "score": 6.5, "reasoning": "Pay cut", "severity": "Severe"}],
            "overall_risk_level": 6.5,
            "risk_summary": "Moderate"
        }"#;
        let output: RiskOutput = serde_json::from_str(json).unwrap();

        assert!(output.validate().is_ok());
        assert_eq!(output.risk_scores[0].severity_level(), None);
    }

    #[test]
    fn risk_output_rejects_out_of_range_scores() {
        let output = RiskOutput {
            risk_scores: vec![risk("Salary", 10.5, "high")],
            overall_risk_level: 5.0,
            risk_summary: "summary".to_string(),
        };
        assert!(matches!(
            output.validate(),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "risk_scores[0].score"
        ));

        let output = RiskOutput {
            risk_scores: vec![risk("Salary", 5.0, "high")],
            overall_risk_level: -1.0,
            risk_summary: "summary".to_string(),
        };
        assert!(output.validate().is_err());
    }

    #[test]
    fn empty_lists_and_text_are_accepted() {
        let json = r#"{
            "risk_scores": [{"factor_name": "Salary", "score": 4.0, "reasoning": "", "severity": ""}],
            "overall_risk_level": 4.0,
            "risk_summary": ""
        }"#;
        let output: RiskOutput = serde_json::from_str(json).unwrap();
        assert!(output.validate().is_ok());

        let output = RiskOutput {
            risk_scores: vec![],
            overall_risk_level: 0.0,
            risk_summary: "summary".to_string(),
        };
        assert!(output.validate().is_ok());

        let output = OpportunityOutput {
            opportunity_scores: vec![],
            overall_opportunity_level: 0.0,
            opportunity_summary: String::new(),
        };
        assert!(output.validate().is_ok());
    }

    #[test]
    fn missing_fields_fail_deserialization() {
        let json = r#"{"risk_scores": [], "overall_risk_level": 4.0}"#;
        assert!(serde_json::from_str::<RiskOutput>(json).is_err());
    }

    #[test]
    fn opportunity_output_validates_bounds() {
        let output = OpportunityOutput {
            opportunity_scores: vec![OpportunityScore {
                factor_name: "Growth".to_string(),
                score: 10.0,
                reasoning: "Big upside".to_string(),
                potential: "Transformative".to_string(),
            }],
            overall_opportunity_level: 10.0,
            opportunity_summary: "Strong".to_string(),
        };
        assert!(output.validate().is_ok());
        assert_eq!(
            output.opportunity_scores[0].potential_level(),
            Some(Potential::Transformative)
        );
    }

    #[test]
    fn schema_lists_allowed_labels() {
        let schema = RiskOutput::output_schema().to_json_schema();
        let severity = &schema["properties"]["risk_scores"]["items"]["properties"]["severity"];
        assert_eq!(
            severity["enum"],
            serde_json::json!(["low", "medium", "high", "critical"])
        );
    }
}
