//! Final synthesis produced by the strategize step.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{
    require_count, require_in_range, require_min_items, ValidationError,
};

use super::scores::{MAX_SCORE, MIN_SCORE};
use super::structured::{FieldType, OutputSchema, SchemaField, StructuredOutput};

/// Fewest key insights a recommendation may carry.
pub const MIN_INSIGHTS: usize = 3;

/// Most key insights a recommendation may carry.
pub const MAX_INSIGHTS: usize = 5;

/// Categorical verdict on the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Verdict {
    Proceed,
    ProceedWithCaution,
    DoNotProceed,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [
        Verdict::Proceed,
        Verdict::ProceedWithCaution,
        Verdict::DoNotProceed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Proceed => "Proceed",
            Verdict::ProceedWithCaution => "Proceed with Caution",
            Verdict::DoNotProceed => "Do Not Proceed",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = ValidationError;

    /// Accepts any casing, with `_` or `-` in place of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "recommendation",
                    format!(
                        "'{}' is not one of Proceed, Proceed with Caution, Do Not Proceed",
                        s
                    ),
                )
            })
    }
}

impl TryFrom<String> for Verdict {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Verdict> for String {
    fn from(verdict: Verdict) -> Self {
        verdict.as_str().to_string()
    }
}

/// Priority of a next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub const ALL: [ActionPriority; 3] =
        [ActionPriority::High, ActionPriority::Medium, ActionPriority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPriority::High => "high",
            ActionPriority::Medium => "medium",
            ActionPriority::Low => "low",
        }
    }
}

impl fmt::Display for ActionPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "priority",
                    format!("'{}' is not one of high, medium, low", s),
                )
            })
    }
}

impl TryFrom<String> for ActionPriority {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionPriority> for String {
    fn from(priority: ActionPriority) -> Self {
        priority.as_str().to_string()
    }
}

/// A concrete next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub action: String,
    pub priority: ActionPriority,
    /// When to do this.
    pub timeframe: String,
}

/// The strategic recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Echo of the decision text.
    pub decision: String,
    pub recommendation: Verdict,
    /// Confidence in `[0, 1]`.
    pub confidence_level: f64,
    pub key_insights: Vec<String>,
    pub risk_reward_balance: String,
    pub next_steps: Vec<ActionItem>,
    #[serde(default)]
    pub critical_assumptions: Vec<String>,
    #[serde(default)]
    pub watch_signals: Vec<String>,
    /// Copied from the risk step once the recommendation is accepted.
    #[serde(default)]
    pub overall_risk_score: f64,
    /// Copied from the opportunity step once the recommendation is accepted.
    #[serde(default)]
    pub overall_opportunity_score: f64,
}

impl Recommendation {
    /// Next steps ordered high priority first, stable within a priority.
    pub fn prioritized_steps(&self) -> Vec<&ActionItem> {
        let mut steps: Vec<&ActionItem> = self.next_steps.iter().collect();
        steps.sort_by_key(|s| s.priority);
        steps
    }
}

impl StructuredOutput for Recommendation {
    fn output_schema() -> OutputSchema {
        let string_list = || FieldType::Array(Box::new(FieldType::String));
        OutputSchema::new(
            "Recommendation",
            "Final strategic recommendation",
            vec![
                SchemaField::required("decision", FieldType::String, "The original decision"),
                SchemaField::required(
                    "recommendation",
                    FieldType::Enum(Verdict::ALL.iter().map(|v| v.as_str().to_string()).collect()),
                    "Clear recommendation: Proceed, Proceed with Caution, or Do Not Proceed",
                ),
                SchemaField::required(
                    "confidence_level",
                    FieldType::Number,
                    "Confidence in recommendation (0-1)",
                )
                .with_range(0.0, 1.0),
                SchemaField::required(
                    "key_insights",
                    string_list(),
                    "3-5 key insights from the analysis",
                )
                .with_items(Some(MIN_INSIGHTS), Some(MAX_INSIGHTS)),
                SchemaField::required(
                    "risk_reward_balance",
                    FieldType::String,
                    "Summary of risk vs opportunity balance",
                ),
                SchemaField::required(
                    "next_steps",
                    FieldType::Array(Box::new(FieldType::Object(vec![
                        SchemaField::required("action", FieldType::String, "The action to take"),
                        SchemaField::required(
                            "priority",
                            FieldType::Enum(
                                ActionPriority::ALL
                                    .iter()
                                    .map(|p| p.as_str().to_string())
                                    .collect(),
                            ),
                            "high, medium, low",
                        ),
                        SchemaField::required("timeframe", FieldType::String, "When to do this"),
                    ]))),
                    "Concrete next steps",
                )
                .with_items(Some(1), None),
                SchemaField::optional(
                    "critical_assumptions",
                    string_list(),
                    "Key assumptions this recommendation depends on",
                ),
                SchemaField::optional(
                    "watch_signals",
                    string_list(),
                    "Signals to monitor that might change the recommendation",
                ),
                SchemaField::optional(
                    "overall_risk_score",
                    FieldType::Number,
                    "Overall risk score 0-10",
                )
                .with_range(MIN_SCORE, MAX_SCORE),
                SchemaField::optional(
                    "overall_opportunity_score",
                    FieldType::Number,
                    "Overall opportunity score 0-10",
                )
                .with_range(MIN_SCORE, MAX_SCORE),
            ],
        )
    }

    /// The overall scores are not checked: the backend's values are
    /// replaced with the scoring steps' levels once the step is accepted.
    fn validate(&self) -> Result<(), ValidationError> {
        require_in_range("confidence_level", self.confidence_level, 0.0, 1.0)?;
        require_count(
            "key_insights",
            self.key_insights.len(),
            MIN_INSIGHTS,
            MAX_INSIGHTS,
        )?;
        require_min_items("next_steps", self.next_steps.len(), 1)
    }
}
