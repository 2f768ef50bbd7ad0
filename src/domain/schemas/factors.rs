//! Evaluation factors produced by the planning step.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{require_count, ValidationError};

use super::structured::{FieldType, OutputSchema, SchemaField, StructuredOutput};

/// Fewest factors a plan may contain.
pub const MIN_FACTORS: usize = 3;

/// Most factors a plan may contain.
pub const MAX_FACTORS: usize = 10;

/// Dimension a factor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FactorCategory {
    Financial,
    Personal,
    Professional,
    Social,
    Health,
}

impl FactorCategory {
    pub const ALL: [FactorCategory; 5] = [
        FactorCategory::Financial,
        FactorCategory::Personal,
        FactorCategory::Professional,
        FactorCategory::Social,
        FactorCategory::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorCategory::Financial => "financial",
            FactorCategory::Personal => "personal",
            FactorCategory::Professional => "professional",
            FactorCategory::Social => "social",
            FactorCategory::Health => "health",
        }
    }

    fn labels() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for FactorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FactorCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "category",
                    format!("'{}' is not one of {}", s, Self::labels().join(", ")),
                )
            })
    }
}

impl TryFrom<String> for FactorCategory {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FactorCategory> for String {
    fn from(category: FactorCategory) -> Self {
        category.as_str().to_string()
    }
}

/// A single factor to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationFactor {
    /// Factor name, referenced by every later step.
    pub name: String,
    /// Why this factor matters.
    pub description: String,
    pub category: FactorCategory,
}

impl EvaluationFactor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: FactorCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
        }
    }
}

/// Output of the planning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerOutput {
    /// Ordered factors, between [`MIN_FACTORS`] and [`MAX_FACTORS`].
    pub factors: Vec<EvaluationFactor>,
    /// Summarized understanding of the decision.
    pub decision_summary: String,
}

impl PlannerOutput {
    /// Creates a validated planner output.
    pub fn new(
        factors: Vec<EvaluationFactor>,
        decision_summary: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let output = Self {
            factors,
            decision_summary: decision_summary.into(),
        };
        output.validate()?;
        Ok(output)
    }

    /// Factor names in plan order.
    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name.as_str()).collect()
    }

    /// Case-insensitive lookup of a planned factor.
    pub fn find_factor(&self, name: &str) -> Option<&EvaluationFactor> {
        let wanted = name.trim();
        self.factors
            .iter()
            .find(|f| f.name.trim().eq_ignore_ascii_case(wanted))
    }
}

impl StructuredOutput for PlannerOutput {
    fn output_schema() -> OutputSchema {
        OutputSchema::new(
            "PlannerOutput",
            "Key evaluation factors for the decision",
            vec![
                SchemaField::required(
                    "factors",
                    FieldType::Array(Box::new(FieldType::Object(vec![
                        SchemaField::required("name", FieldType::String, "Factor name"),
                        SchemaField::required(
                            "description",
                            FieldType::String,
                            "Why this factor matters",
                        ),
                        SchemaField::required(
                            "category",
                            FieldType::Enum(FactorCategory::labels()),
                            "Category: financial, personal, professional, social, health",
                        ),
                    ]))),
                    "List of factors to evaluate",
                )
                .with_items(Some(MIN_FACTORS), Some(MAX_FACTORS)),
                SchemaField::required(
                    "decision_summary",
                    FieldType::String,
                    "Summarized understanding of the decision",
                ),
            ],
        )
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_count("factors", self.factors.len(), MIN_FACTORS, MAX_FACTORS)
    }
}
