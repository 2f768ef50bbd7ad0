//! PipelineOrchestrator - Drives the five-node state machine.
//!
//! The [`AnalysisState`] is moved into each node and returned from it. A
//! node that sees `state.error` already set hands the state back untouched,
//! so every node after a failure is a no-op. A node failure is recorded as
//! `"{Label} error: {cause}"` and never escapes as a `Result`.

use tracing::{debug, error, info, warn};

use crate::application::steps::StepExecutor;
use crate::config::PipelineConfig;
use crate::domain::agents::{StepError, StepKind, StepOutput, StepRequest};
use crate::domain::foundation::{RunId, StateMachine};
use crate::domain::schemas::{AnalysisState, OpportunityOutput, Recommendation, RiskOutput};
use crate::domain::scoring::{ScoreValidator, ScoringEngine};

use super::progress::{notify, Checkpoint, ProgressCallback};

/// Differences smaller than this are rounding noise.
const AGGREGATION_TOLERANCE: f64 = 0.01;

/// Runs steps against a shared executor and commits their results.
pub struct PipelineOrchestrator {
    executor: StepExecutor,
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(executor: StepExecutor, config: PipelineConfig) -> Self {
        Self { executor, config }
    }

    /// Drives a fresh state through every node in order.
    pub async fn run(
        &self,
        state: AnalysisState,
        progress: Option<&dyn ProgressCallback>,
    ) -> AnalysisState {
        let mut state = state;

        for kind in [StepKind::Plan, StepKind::Research] {
            state = self.run_node(kind, state).await;
            report(kind, &state, progress);
        }

        if self.config.parallel_scoring {
            state = self.score_in_parallel(state, progress).await;
        } else {
            for kind in [StepKind::Risk, StepKind::Opportunity] {
                state = self.run_node(kind, state).await;
                report(kind, &state, progress);
            }
        }

        state = self.run_node(StepKind::Strategize, state).await;
        report(StepKind::Strategize, &state, progress);
        state
    }

    /// Runs a single node. A state that already carries an error is returned unchanged.
    pub async fn run_node(&self, kind: StepKind, state: AnalysisState) -> AnalysisState {
        if state.has_error() {
            debug!(run_id = %state.run_id, step = %kind, "skipping step after earlier error");
            return state;
        }

        info!(run_id = %state.run_id, step = %kind, "running step");
        let result = self
            .execute(state.run_id, StepRequest::from_state(kind, &state))
            .await;
        self.commit(kind, state, result)
    }

    /// Risk and Opportunity only read Plan and Research, so their backend
    /// calls can overlap. Results are committed Risk first, exactly as the
    /// serial path would.
    async fn score_in_parallel(
        &self,
        state: AnalysisState,
        progress: Option<&dyn ProgressCallback>,
    ) -> AnalysisState {
        if state.has_error() {
            debug!(run_id = %state.run_id, "skipping scoring steps after earlier error");
            return state;
        }

        info!(run_id = %state.run_id, "running risk and opportunity steps concurrently");
        let (risk, opportunity) = futures::join!(
            self.execute(state.run_id, StepRequest::from_state(StepKind::Risk, &state)),
            self.execute(
                state.run_id,
                StepRequest::from_state(StepKind::Opportunity, &state)
            ),
        );

        let state = self.commit(StepKind::Risk, state, risk);
        report(StepKind::Risk, &state, progress);
        if state.has_error() {
            debug!(run_id = %state.run_id, step = %StepKind::Opportunity, "discarding result after earlier error");
            return state;
        }

        let state = self.commit(StepKind::Opportunity, state, opportunity);
        report(StepKind::Opportunity, &state, progress);
        state
    }

    async fn execute(
        &self,
        run_id: RunId,
        request: Result<StepRequest<'_>, StepError>,
    ) -> Result<StepOutput, StepError> {
        self.executor.execute(run_id, request?).await
    }

    fn commit(
        &self,
        kind: StepKind,
        mut state: AnalysisState,
        result: Result<StepOutput, StepError>,
    ) -> AnalysisState {
        match result.and_then(|output| self.apply(&mut state, output)) {
            Ok(()) => {
                debug!(run_id = %state.run_id, step = %kind, current = %state.current_step, "step complete");
            }
            Err(err) => {
                error!(run_id = %state.run_id, step = %kind, error = %err, "step failed");
                state.fail(format!("{} error: {}", kind.label(), err));
            }
        }
        state
    }

    /// Writes a step's output into the state and advances the step marker.
    fn apply(&self, state: &mut AnalysisState, output: StepOutput) -> Result<(), StepError> {
        let next = state
            .current_step
            .transition_to(output.kind().completed_step())
            .map_err(|e| StepError::precondition(e.to_string()))?;
        let run_id = state.run_id;

        match output {
            StepOutput::Plan(plan) => {
                info!(%run_id, factors = plan.factors.len(), "planner complete");
                state.planner_output = Some(plan);
            }
            StepOutput::Research(research) => {
                if let Some(ref plan) = state.planner_output {
                    let unknown = research.unknown_factors(plan);
                    if !unknown.is_empty() {
                        warn!(%run_id, unknown = ?unknown, "research analysed factors that were not planned");
                    }
                }
                info!(%run_id, analyses = research.analyses.len(), "research complete");
                state.research_output = Some(research);
            }
            StepOutput::Risk(mut risk) => {
                for violation in ScoreValidator::validate_risk_output(&risk) {
                    warn!(%run_id, %violation, "risk output check");
                }
                if self.config.deterministic_aggregation {
                    reaggregate_risk(run_id, &mut risk);
                }
                info!(
                    %run_id,
                    scores = risk.risk_scores.len(),
                    overall_risk = risk.overall_risk_level,
                    "risk complete"
                );
                state.risk_output = Some(risk);
            }
            StepOutput::Opportunity(mut opportunity) => {
                for violation in ScoreValidator::validate_opportunity_output(&opportunity) {
                    warn!(%run_id, %violation, "opportunity output check");
                }
                if self.config.deterministic_aggregation {
                    reaggregate_opportunity(run_id, &mut opportunity);
                }
                if let Some(ref risk) = state.risk_output {
                    for warning in ScoreValidator::validate_consistency(risk, &opportunity) {
                        warn!(%run_id, %warning, "factor coverage differs");
                    }
                }
                info!(
                    %run_id,
                    scores = opportunity.opportunity_scores.len(),
                    overall_opportunity = opportunity.overall_opportunity_level,
                    "opportunity complete"
                );
                state.opportunity_output = Some(opportunity);
            }
            StepOutput::Strategize(mut recommendation) => {
                let (Some(risk), Some(opportunity)) =
                    (state.risk_output.as_ref(), state.opportunity_output.as_ref())
                else {
                    return Err(StepError::precondition("scoring outputs are not available"));
                };
                stamp_scores(run_id, &mut recommendation, risk, opportunity);
                info!(
                    %run_id,
                    verdict = %recommendation.recommendation,
                    confidence = recommendation.confidence_level,
                    "strategist complete"
                );
                state.recommendation = Some(recommendation);
            }
        }

        state.current_step = next;
        Ok(())
    }
}

fn report(kind: StepKind, state: &AnalysisState, progress: Option<&dyn ProgressCallback>) {
    if !state.has_error() && state.current_step == kind.completed_step() {
        notify(progress, Checkpoint::after(kind));
    }
}

fn reaggregate_risk(run_id: RunId, risk: &mut RiskOutput) {
    let computed = ScoringEngine::overall_risk(&risk.risk_scores);
    if (computed - risk.overall_risk_level).abs() > AGGREGATION_TOLERANCE {
        warn!(
            %run_id,
            reported = risk.overall_risk_level,
            computed,
            "overall risk differs from severity-weighted average"
        );
    }
    risk.overall_risk_level = computed;
}

fn reaggregate_opportunity(run_id: RunId, opportunity: &mut OpportunityOutput) {
    let computed = ScoringEngine::overall_opportunity(&opportunity.opportunity_scores);
    if (computed - opportunity.overall_opportunity_level).abs() > AGGREGATION_TOLERANCE {
        warn!(
            %run_id,
            reported = opportunity.overall_opportunity_level,
            computed,
            "overall opportunity differs from potential-weighted average"
        );
    }
    opportunity.overall_opportunity_level = computed;
}

/// Overwrites the recommendation's scores with the scoring steps' values.
fn stamp_scores(
    run_id: RunId,
    recommendation: &mut Recommendation,
    risk: &RiskOutput,
    opportunity: &OpportunityOutput,
) {
    recommendation.overall_risk_score = risk.overall_risk_level;
    recommendation.overall_opportunity_score = opportunity.overall_opportunity_level;

    let summary = ScoringEngine::summarize(risk, opportunity);
    if summary.category != recommendation.recommendation {
        info!(
            %run_id,
            verdict = %recommendation.recommendation,
            rule = %summary.category,
            ratio = summary.risk_reward_ratio,
            "verdict differs from scoring rule"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockError, MockTextGenerator};
    use crate::domain::schemas::{DecisionInput, PipelineStep};
    use serde_json::json;
    use std::sync::Arc;

    fn orchestrator(generator: &MockTextGenerator) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            StepExecutor::new(Arc::new(generator.clone())),
            PipelineConfig::default(),
        )
    }

    fn state() -> AnalysisState {
        AnalysisState::new(DecisionInput::new("Should I learn to fly a plane?").unwrap())
    }

    fn plan_json() -> serde_json::Value {
        json!({
            "factors": [
                {"name": "Cost", "description": "Lessons", "category": "financial"},
                {"name": "Time", "description": "Weekends", "category": "personal"},
                {"name": "Safety", "description": "Risk", "category": "health"}
            ],
            "decision_summary": "Pilot licence"
        })
    }

    fn risk_json(overall: f64) -> serde_json::Value {
        json!({
            "risk_scores": [
                {"factor_name": "Cost", "score": 6.0, "reasoning": "Expensive", "severity": "high"},
                {"factor_name": "Safety", "score": 3.0, "reasoning": "Training", "severity": "low"}
            ],
            "overall_risk_level": overall,
            "risk_summary": "Moderate"
        })
    }

    #[tokio::test]
    async fn node_records_output_and_advances() {
        let generator = MockTextGenerator::new().with_structured(plan_json());

        let state = orchestrator(&generator).run_node(StepKind::Plan, state()).await;

        assert_eq!(state.current_step, PipelineStep::PlannerComplete);
        assert_eq!(state.planner_output.unwrap().factors.len(), 3);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn node_failure_is_prefixed_with_label() {
        let generator = MockTextGenerator::new().with_error(MockError::Network {
            message: "connection reset".to_string(),
        });

        let state = orchestrator(&generator).run_node(StepKind::Plan, state()).await;

        assert_eq!(state.current_step, PipelineStep::Error);
        assert_eq!(
            state.error.as_deref(),
            Some("Planner error: backend unavailable: network error: connection reset")
        );
        assert!(state.planner_output.is_none());
    }

    #[tokio::test]
    async fn node_after_error_is_a_no_op() {
        let generator = MockTextGenerator::new().with_structured(plan_json());
        let mut failed = state();
        failed.fail("Planner error: boom");
        let before = failed.clone();

        let after = orchestrator(&generator).run_node(StepKind::Research, failed).await;

        assert_eq!(after, before);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_upstream_output_is_precondition_failure() {
        let generator = MockTextGenerator::new();

        let state = orchestrator(&generator).run_node(StepKind::Risk, state()).await;

        assert_eq!(
            state.error.as_deref(),
            Some("Risk error: precondition failed: planner_output is not available")
        );
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn reaggregation_replaces_reported_level() {
        let mut risk: RiskOutput = serde_json::from_value(risk_json(9.0)).unwrap();
        reaggregate_risk(RunId::new(), &mut risk);
        // (6*2 + 3*1) / 3
        assert_eq!(risk.overall_risk_level, 5.0);
    }

    #[tokio::test]
    async fn aggregation_can_be_disabled() {
        let generator = MockTextGenerator::new().with_structured(risk_json(9.0));
        let orchestrator = PipelineOrchestrator::new(
            StepExecutor::new(Arc::new(generator.clone())),
            PipelineConfig::default().with_deterministic_aggregation(false),
        );
        let mut state = state();
        state.planner_output = Some(serde_json::from_value(plan_json()).unwrap());
        state.research_output = Some(
            serde_json::from_value(json!({
                "analyses": [{"factor_name": "Cost", "insights": "About 15k"}]
            }))
            .unwrap(),
        );
        state.current_step = PipelineStep::ResearchComplete;

        let state = orchestrator.run_node(StepKind::Risk, state).await;

        assert_eq!(state.risk_output.unwrap().overall_risk_level, 9.0);
        assert_eq!(state.current_step, PipelineStep::RiskComplete);
    }

    #[tokio::test]
    async fn out_of_order_commit_is_rejected() {
        let generator = MockTextGenerator::new().with_structured(risk_json(5.0));
        let mut state = state();
        state.planner_output = Some(serde_json::from_value(plan_json()).unwrap());
        state.research_output = Some(
            serde_json::from_value(json!({
                "analyses": [{"factor_name": "Cost", "insights": "About 15k"}]
            }))
            .unwrap(),
        );
        // marker still at Initialized, so RiskComplete is not a legal next step

        let state = orchestrator(&generator).run_node(StepKind::Risk, state).await;

        assert!(state.error.unwrap().starts_with("Risk error: precondition failed"));
        assert!(state.risk_output.is_none());
    }
}
