//! Per-factor research produced by the research step.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

use super::factors::PlannerOutput;
use super::structured::{FieldType, OutputSchema, SchemaField, StructuredOutput};

/// Used when the backend omits `overall_context`.
pub const DEFAULT_OVERALL_CONTEXT: &str = "Context analysis completed based on provided factors.";

fn default_overall_context() -> String {
    DEFAULT_OVERALL_CONTEXT.to_string()
}

/// Research on a single planned factor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorAnalysis {
    /// Name of the planned factor this analysis covers.
    pub factor_name: String,
    pub insights: String,
    #[serde(default)]
    pub data_points: Vec<String>,
}

/// Output of the research step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub analyses: Vec<FactorAnalysis>,
    #[serde(default = "default_overall_context")]
    pub overall_context: String,
}

impl ResearchOutput {
    /// Names of analyses that reference no planned factor.
    pub fn unknown_factors<'a>(&'a self, plan: &PlannerOutput) -> Vec<&'a str> {
        self.analyses
            .iter()
            .filter(|a| plan.find_factor(&a.factor_name).is_none())
            .map(|a| a.factor_name.as_str())
            .collect()
    }

    /// Analysis for a factor, matched case-insensitively.
    pub fn analysis_for(&self, factor_name: &str) -> Option<&FactorAnalysis> {
        let wanted = factor_name.trim();
        self.analyses
            .iter()
            .find(|a| a.factor_name.trim().eq_ignore_ascii_case(wanted))
    }
}

impl StructuredOutput for ResearchOutput {
    fn output_schema() -> OutputSchema {
        OutputSchema::new(
            "ResearchOutput",
            "Contextual research for each evaluation factor",
            vec![
                SchemaField::required(
                    "analyses",
                    FieldType::Array(Box::new(FieldType::Object(vec![
                        SchemaField::required(
                            "factor_name",
                            FieldType::String,
                            "Exact name of the factor being analyzed",
                        ),
                        SchemaField::required(
                            "insights",
                            FieldType::String,
                            "Key insights about this factor",
                        ),
                        SchemaField::optional(
                            "data_points",
                            FieldType::Array(Box::new(FieldType::String)),
                            "Specific data points or evidence",
                        ),
                    ]))),
                    "Analysis for each factor",
                ),
                SchemaField::optional(
                    "overall_context",
                    FieldType::String,
                    "Overall contextual understanding",
                ),
            ],
        )
    }

    /// Every field is free text, so presence (checked by serde) is enough.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
