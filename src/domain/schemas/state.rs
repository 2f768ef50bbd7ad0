//! Accumulated state of one pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{RunId, StateMachine, Timestamp};

use super::decision::DecisionInput;
use super::factors::PlannerOutput;
use super::recommendation::Recommendation;
use super::research::ResearchOutput;
use super::scores::{OpportunityOutput, RiskOutput};

/// Marker for how far a run has progressed.
///
/// Linear chain `Initialized -> PlannerComplete -> ... -> Complete`, with
/// `Error` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    #[default]
    Initialized,
    PlannerComplete,
    ResearchComplete,
    RiskComplete,
    OpportunityComplete,
    Complete,
    Error,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Initialized => "initialized",
            PipelineStep::PlannerComplete => "planner_complete",
            PipelineStep::ResearchComplete => "research_complete",
            PipelineStep::RiskComplete => "risk_complete",
            PipelineStep::OpportunityComplete => "opportunity_complete",
            PipelineStep::Complete => "complete",
            PipelineStep::Error => "error",
        }
    }

    fn next(&self) -> Option<PipelineStep> {
        match self {
            PipelineStep::Initialized => Some(PipelineStep::PlannerComplete),
            PipelineStep::PlannerComplete => Some(PipelineStep::ResearchComplete),
            PipelineStep::ResearchComplete => Some(PipelineStep::RiskComplete),
            PipelineStep::RiskComplete => Some(PipelineStep::OpportunityComplete),
            PipelineStep::OpportunityComplete => Some(PipelineStep::Complete),
            PipelineStep::Complete | PipelineStep::Error => None,
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for PipelineStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self.next() {
            Some(next) => vec![next, PipelineStep::Error],
            None => vec![],
        }
    }
}

/// Everything one run has produced so far.
///
/// Owned by the orchestrator for the duration of a run and moved from node to
/// node. Once `error` is set no further output slot is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisState {
    pub run_id: RunId,
    pub started_at: Timestamp,
    pub decision_input: DecisionInput,
    pub planner_output: Option<PlannerOutput>,
    pub research_output: Option<ResearchOutput>,
    pub risk_output: Option<RiskOutput>,
    pub opportunity_output: Option<OpportunityOutput>,
    pub recommendation: Option<Recommendation>,
    pub current_step: PipelineStep,
    pub error: Option<String>,
}

impl AnalysisState {
    /// Fresh state holding only the decision.
    pub fn new(decision_input: DecisionInput) -> Self {
        Self {
            run_id: RunId::new(),
            started_at: Timestamp::now(),
            decision_input,
            planner_output: None,
            research_output: None,
            risk_output: None,
            opportunity_output: None,
            recommendation: None,
            current_step: PipelineStep::Initialized,
            error: None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// True once the recommendation has been produced.
    pub fn is_complete(&self) -> bool {
        self.current_step == PipelineStep::Complete && self.recommendation.is_some()
    }

    /// Records a failure and moves to the absorbing error state.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.current_step = PipelineStep::Error;
    }
}
