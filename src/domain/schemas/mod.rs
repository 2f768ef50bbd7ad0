//! Output schema set.
//!
//! Typed results for every pipeline step plus the shared [`AnalysisState`]
//! that accumulates them. Each step result implements [`StructuredOutput`]
//! so it can be requested from a backend and validated afterwards.

mod decision;
mod factors;
mod recommendation;
mod research;
mod scores;
mod state;
mod structured;

pub use decision::{DecisionInput, DEFAULT_CONTEXT, DEFAULT_TIMEFRAME, MIN_DECISION_LENGTH};
pub use factors::{EvaluationFactor, FactorCategory, PlannerOutput, MAX_FACTORS, MIN_FACTORS};
pub use recommendation::{
    ActionItem, ActionPriority, Recommendation, Verdict, MAX_INSIGHTS, MIN_INSIGHTS,
};
pub use research::{FactorAnalysis, ResearchOutput, DEFAULT_OVERALL_CONTEXT};
pub use scores::{
    OpportunityOutput, OpportunityScore, Potential, RiskOutput, RiskScore, Severity, MAX_SCORE,
    MIN_SCORE,
};
pub use state::{AnalysisState, PipelineStep};
pub use structured::{FieldType, OutputSchema, SchemaField, StructuredOutput};
