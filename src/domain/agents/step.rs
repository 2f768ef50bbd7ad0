//! The closed set of reasoning steps.
//!
//! A [`StepRequest`] borrows exactly the upstream outputs its step needs, so a
//! request can only be built once those outputs exist. The matching
//! [`StepOutput`] variant carries the typed result back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::schemas::{
    AnalysisState, DecisionInput, OpportunityOutput, OutputSchema, PipelineStep, PlannerOutput,
    Recommendation, ResearchOutput, RiskOutput, StructuredOutput,
};

use super::errors::StepError;
use super::prompts;

/// One of the five pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Plan,
    Research,
    Risk,
    Opportunity,
    Strategize,
}

impl StepKind {
    /// Steps in execution order.
    pub const ALL: [StepKind; 5] = [
        StepKind::Plan,
        StepKind::Research,
        StepKind::Risk,
        StepKind::Opportunity,
        StepKind::Strategize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Plan => "plan",
            StepKind::Research => "research",
            StepKind::Risk => "risk",
            StepKind::Opportunity => "opportunity",
            StepKind::Strategize => "strategize",
        }
    }

    /// Name used to prefix error messages, e.g. "Research error: ...".
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Plan => "Planner",
            StepKind::Research => "Research",
            StepKind::Risk => "Risk",
            StepKind::Opportunity => "Opportunity",
            StepKind::Strategize => "Strategist",
        }
    }

    /// Marker the state advances to once this step succeeds.
    pub fn completed_step(&self) -> PipelineStep {
        match self {
            StepKind::Plan => PipelineStep::PlannerComplete,
            StepKind::Research => PipelineStep::ResearchComplete,
            StepKind::Risk => PipelineStep::RiskComplete,
            StepKind::Opportunity => PipelineStep::OpportunityComplete,
            StepKind::Strategize => PipelineStep::Complete,
        }
    }

    /// Schema the step's result must satisfy.
    pub fn output_schema(&self) -> OutputSchema {
        match self {
            StepKind::Plan => PlannerOutput::output_schema(),
            StepKind::Research => ResearchOutput::output_schema(),
            StepKind::Risk => RiskOutput::output_schema(),
            StepKind::Opportunity => OpportunityOutput::output_schema(),
            StepKind::Strategize => Recommendation::output_schema(),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for one step, borrowed from the run's state.
#[derive(Debug, Clone, Copy)]
pub enum StepRequest<'a> {
    Plan {
        input: &'a DecisionInput,
    },
    Research {
        input: &'a DecisionInput,
        plan: &'a PlannerOutput,
    },
    Risk {
        input: &'a DecisionInput,
        plan: &'a PlannerOutput,
        research: &'a ResearchOutput,
    },
    Opportunity {
        input: &'a DecisionInput,
        plan: &'a PlannerOutput,
        research: &'a ResearchOutput,
    },
    Strategize {
        input: &'a DecisionInput,
        research: &'a ResearchOutput,
        risk: &'a RiskOutput,
        opportunity: &'a OpportunityOutput,
    },
}

impl<'a> StepRequest<'a> {
    /// Builds the request for `kind` from whatever the state holds.
    ///
    /// # Errors
    ///
    /// `PipelinePrecondition` naming the first missing upstream output.
    pub fn from_state(kind: StepKind, state: &'a AnalysisState) -> Result<Self, StepError> {
        let input = &state.decision_input;
        let request = match kind {
            StepKind::Plan => StepRequest::Plan { input },
            StepKind::Research => StepRequest::Research {
                input,
                plan: require(state.planner_output.as_ref(), "planner_output")?,
            },
            StepKind::Risk => StepRequest::Risk {
                input,
                plan: require(state.planner_output.as_ref(), "planner_output")?,
                research: require(state.research_output.as_ref(), "research_output")?,
            },
            StepKind::Opportunity => StepRequest::Opportunity {
                input,
                plan: require(state.planner_output.as_ref(), "planner_output")?,
                research: require(state.research_output.as_ref(), "research_output")?,
            },
            StepKind::Strategize => StepRequest::Strategize {
                input,
                risk: require(state.risk_output.as_ref(), "risk_output")?,
                opportunity: require(state.opportunity_output.as_ref(), "opportunity_output")?,
                research: require(state.research_output.as_ref(), "research_output")?,
            },
        };
        Ok(request)
    }

    pub fn kind(&self) -> StepKind {
        match self {
            StepRequest::Plan { .. } => StepKind::Plan,
            StepRequest::Research { .. } => StepKind::Research,
            StepRequest::Risk { .. } => StepKind::Risk,
            StepRequest::Opportunity { .. } => StepKind::Opportunity,
            StepRequest::Strategize { .. } => StepKind::Strategize,
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        prompts::system_prompt_for_step(self.kind())
    }

    /// Renders the user prompt from the borrowed inputs.
    pub fn user_prompt(&self) -> String {
        match *self {
            StepRequest::Plan { input } => prompts::plan_prompt(input),
            StepRequest::Research { input, plan } => prompts::research_prompt(input, plan),
            StepRequest::Risk {
                input,
                plan,
                research,
            } => prompts::risk_prompt(input, plan, research),
            StepRequest::Opportunity {
                input,
                plan,
                research,
            } => prompts::opportunity_prompt(input, plan, research),
            StepRequest::Strategize {
                input,
                research,
                risk,
                opportunity,
            } => prompts::strategize_prompt(input, research, risk, opportunity),
        }
    }
}

fn require<'a, T>(value: Option<&'a T>, name: &str) -> Result<&'a T, StepError> {
    value.ok_or_else(|| StepError::precondition(format!("{} is not available", name)))
}

/// Typed result of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    Plan(PlannerOutput),
    Research(ResearchOutput),
    Risk(RiskOutput),
    Opportunity(OpportunityOutput),
    Strategize(Recommendation),
}

impl StepOutput {
    pub fn kind(&self) -> StepKind {
        match self {
            StepOutput::Plan(_) => StepKind::Plan,
            StepOutput::Research(_) => StepKind::Research,
            StepOutput::Risk(_) => StepKind::Risk,
            StepOutput::Opportunity(_) => StepKind::Opportunity,
            StepOutput::Strategize(_) => StepKind::Strategize,
        }
    }
}
