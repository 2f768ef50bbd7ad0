//! End-to-end runs of the pipeline against the scripted text generator.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use decision_advisor::adapters::ai::{MockError, MockTextGenerator};
use decision_advisor::application::{PipelineError, PipelineOrchestrator, PipelineRunner, StepExecutor};
use decision_advisor::config::PipelineConfig;
use decision_advisor::domain::agents::StepKind;
use decision_advisor::domain::schemas::{
    ActionPriority, AnalysisState, DecisionInput, PipelineStep, Verdict,
};

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn input() -> DecisionInput {
    DecisionInput::new("Should I leave my job to start a bakery?")
        .unwrap()
        .with_context("Ten years in accounting, some savings")
        .with_timeframe("6 months")
}

fn plan() -> Value {
    json!({
        "factors": [
            {"name": "Savings", "description": "Runway while the business ramps up", "category": "financial"},
            {"name": "Fulfilment", "description": "Doing work I enjoy", "category": "Personal"},
            {"name": "Career", "description": "Re-entry into accounting", "category": "professional"}
        ],
        "decision_summary": "Career change from accounting to running a bakery"
    })
}

fn research() -> Value {
    json!({
        "analyses": [
            {"factor_name": "Savings", "insights": "12 months of runway", "data_points": ["Rent 2k/month"]},
            {"factor_name": "Fulfilment", "insights": "Long-held ambition"},
            {"factor_name": "Career", "insights": "Accounting skills stay marketable"}
        ],
        "overall_context": "Financially feasible with a clear fallback"
    })
}

fn risk() -> Value {
    // (6*2 + 4*1.5 + 3*1) / 4.5 = 4.67
    json!({
        "risk_scores": [
            {"factor_name": "Savings", "score": 6.0, "reasoning": "Runway is finite", "severity": "high"},
            {"factor_name": "Fulfilment", "score": 4.0, "reasoning": "Reality may disappoint", "severity": "Medium"},
            {"factor_name": "Career", "score": 3.0, "reasoning": "Easy to return", "severity": "low"}
        ],
        "overall_risk_level": 4.67,
        "risk_summary": "Moderate, mostly financial"
    })
}

fn opportunity() -> Value {
    // (5*1.5 + 8*2 + 7*3) / 6.5 = 6.85
    json!({
        "opportunity_scores": [
            {"factor_name": "Savings", "score": 5.0, "reasoning": "Could out-earn salary", "potential": "medium"},
            {"factor_name": "Fulfilment", "score": 8.0, "reasoning": "Daily satisfaction", "potential": "high"},
            {"factor_name": "Career", "score": 7.0, "reasoning": "Business ownership", "potential": "transformative"}
        ],
        "overall_opportunity_level": 6.85,
        "opportunity_summary": "Strong personal upside"
    })
}

fn recommendation() -> Value {
    json!({
        "decision": "Should I leave my job to start a bakery?",
        "recommendation": "proceed with caution",
        "confidence_level": 0.7,
        "key_insights": ["Runway covers a year", "Skills are transferable", "High personal upside"],
        "risk_reward_balance": "Upside outweighs a bounded downside",
        "next_steps": [
            {"action": "Test demand at a weekend market", "priority": "HIGH", "timeframe": "1 month"},
            {"action": "Draft a budget", "priority": "medium", "timeframe": "2 weeks"}
        ],
        "critical_assumptions": ["Rent stays flat"],
        "watch_signals": ["Weekly sales below target"]
    })
}

fn structured_generator() -> MockTextGenerator {
    MockTextGenerator::new()
        .with_structured(plan())
        .with_structured(research())
        .with_structured(risk())
        .with_structured(opportunity())
        .with_structured(recommendation())
}

type Recorded = Arc<Mutex<Vec<(String, u8)>>>;

fn recorder() -> (Recorded, impl Fn(&str, u8) + Send + Sync) {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback = move |label: &str, percent: u8| {
        sink.lock().unwrap().push((label.to_string(), percent));
    };
    (seen, callback)
}

fn percents(seen: &Recorded) -> Vec<u8> {
    seen.lock().unwrap().iter().map(|(_, p)| *p).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Happy paths
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn structured_backend_completes_every_step() {
    let generator = structured_generator();
    let runner = PipelineRunner::new(Arc::new(generator.clone()));
    let (seen, callback) = recorder();

    let state = runner.run(input(), Some(&callback)).await;

    assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
    assert!(state.is_complete());
    assert_eq!(state.current_step, PipelineStep::Complete);
    assert_eq!(generator.call_count(), 5);

    let rec = state.recommendation.as_ref().unwrap();
    assert_eq!(rec.recommendation, Verdict::ProceedWithCaution);
    assert_eq!(rec.next_steps[0].priority, ActionPriority::High);
    assert_eq!(rec.overall_risk_score, 4.67);
    assert_eq!(rec.overall_opportunity_score, 6.85);

    assert_eq!(percents(&seen), vec![30, 50, 70, 85, 100]);
    assert_eq!(seen.lock().unwrap()[4].0, "Complete!");
}

#[tokio::test]
async fn steps_are_called_in_pipeline_order() {
    let generator = structured_generator();
    let runner = PipelineRunner::new(Arc::new(generator.clone()));

    runner.run(input(), None).await;

    let steps: Vec<Option<StepKind>> = generator
        .get_calls()
        .iter()
        .map(|c| c.metadata.step)
        .collect();
    assert_eq!(steps, StepKind::ALL.iter().copied().map(Some).collect::<Vec<_>>());

    let research_prompt = generator.get_calls()[1].last_user_message().unwrap().to_string();
    assert!(research_prompt.contains("- Savings (financial): Runway while the business ramps up"));
}

#[tokio::test]
async fn text_only_backend_uses_fallback_extraction() {
    let generator = MockTextGenerator::new()
        .with_structured_output(false)
        .with_text(format!("```json\n{}\n```", plan()))
        .with_text(format!("Here is the research:\n{}", research()))
        .with_text(risk().to_string())
        .with_text(format!("{} -- scores above", opportunity()))
        .with_text(format!("My {{final}} answer: {}", recommendation()));
    let runner = PipelineRunner::new(Arc::new(generator.clone()));

    let state = runner.run(input(), None).await;

    assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
    assert!(state.is_complete());
    assert!(generator
        .get_calls()
        .iter()
        .all(|c| c.response_schema.is_none()));
}

#[tokio::test]
async fn unsupported_capability_falls_back_per_step() {
    let unsupported = || MockError::Unsupported {
        capability: "json_schema".to_string(),
    };
    let generator = MockTextGenerator::new()
        .with_error(unsupported())
        .with_text(plan().to_string())
        .with_error(unsupported())
        .with_text(research().to_string())
        .with_error(unsupported())
        .with_text(risk().to_string())
        .with_error(unsupported())
        .with_text(opportunity().to_string())
        .with_error(unsupported())
        .with_text(recommendation().to_string());
    let runner = PipelineRunner::new(Arc::new(generator.clone()));

    let rec = runner.get_recommendation(input()).await.unwrap();

    assert_eq!(rec.key_insights.len(), 3);
    assert_eq!(generator.call_count(), 10);
}

#[tokio::test]
async fn sparse_but_well_formed_replies_complete_the_run() {
    let mut risk = risk();
    risk["risk_scores"][0]["reasoning"] = json!("");
    risk["risk_summary"] = json!("");
    let mut rec = recommendation();
    rec["overall_risk_score"] = json!(42.0);
    let generator = MockTextGenerator::new()
        .with_structured(plan())
        .with_structured(json!({"analyses": []}))
        .with_structured(risk)
        .with_structured(json!({
            "opportunity_scores": [],
            "overall_opportunity_level": 0.0,
            "opportunity_summary": ""
        }))
        .with_structured(rec);
    let runner = PipelineRunner::new(Arc::new(generator));

    let state = runner.run(input(), None).await;

    assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
    assert!(state.research_output.as_ref().unwrap().analyses.is_empty());
    let rec = state.recommendation.as_ref().unwrap();
    assert_eq!(rec.overall_risk_score, 4.67);
    assert_eq!(rec.overall_opportunity_score, 0.0);
}

#[tokio::test]
async fn parallel_scoring_matches_serial_result() {
    let serial = PipelineRunner::new(Arc::new(structured_generator()))
        .run(input(), None)
        .await;

    let (seen, callback) = recorder();
    let parallel = PipelineRunner::new(Arc::new(structured_generator()))
        .with_config(PipelineConfig::default().with_parallel_scoring(true))
        .run(input(), Some(&callback))
        .await;

    assert!(parallel.is_complete());
    assert_eq!(parallel.risk_output, serial.risk_output);
    assert_eq!(parallel.opportunity_output, serial.opportunity_output);
    assert_eq!(parallel.recommendation, serial.recommendation);
    assert_eq!(percents(&seen), vec![30, 50, 70, 85, 100]);
}

#[tokio::test]
async fn analysis_state_round_trips_through_json() {
    let state = PipelineRunner::new(Arc::new(structured_generator()))
        .run(input(), None)
        .await;

    let json = serde_json::to_string(&state).unwrap();
    let restored: AnalysisState = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, state);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn research_failure_short_circuits_remaining_steps() {
    let generator = MockTextGenerator::new()
        .with_structured(plan())
        .with_error(MockError::Unavailable {
            message: "model overloaded".to_string(),
        });
    let runner = PipelineRunner::new(Arc::new(generator.clone()));
    let (seen, callback) = recorder();

    let state = runner.run(input(), Some(&callback)).await;

    let error = state.error.as_deref().unwrap();
    assert!(error.contains("Research error"), "got {}", error);
    assert!(error.contains("model overloaded"));
    assert_eq!(state.current_step, PipelineStep::Error);
    assert!(state.planner_output.is_some());
    assert!(state.research_output.is_none());
    assert!(state.risk_output.is_none());
    assert!(state.opportunity_output.is_none());
    assert!(state.recommendation.is_none());
    assert_eq!(generator.call_count(), 2);
    assert_eq!(percents(&seen), vec![30]);
}

#[tokio::test]
async fn malformed_reply_is_reported_with_excerpt() {
    let generator = MockTextGenerator::new()
        .with_structured_output(false)
        .with_text(plan().to_string())
        .with_text("I'm sorry, I can't analyse that.");
    let runner = PipelineRunner::new(Arc::new(generator));

    let err = runner.get_recommendation(input()).await.unwrap_err();

    match err {
        PipelineError::Failed { message } => {
            assert!(message.starts_with("Research error: response format error: no JSON object found"));
            assert!(message.contains("Raw response: I'm sorry"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn risk_failure_in_parallel_mode_discards_opportunity() {
    let generator = MockTextGenerator::new()
        .with_structured(plan())
        .with_structured(research())
        .with_error(MockError::RateLimited { retry_after_secs: 20 })
        .with_structured(opportunity());
    let runner = PipelineRunner::new(Arc::new(generator.clone()))
        .with_config(PipelineConfig::default().with_parallel_scoring(true));
    let (seen, callback) = recorder();

    let state = runner.run(input(), Some(&callback)).await;

    assert_eq!(
        state.error.as_deref(),
        Some("Risk error: backend unavailable: rate limited: retry after 20s")
    );
    assert!(state.opportunity_output.is_none());
    assert_eq!(generator.call_count(), 4);
    assert_eq!(percents(&seen), vec![30, 50]);
}

#[tokio::test]
async fn failed_state_is_never_mutated_by_later_nodes() {
    let generator = structured_generator();
    let orchestrator = PipelineOrchestrator::new(
        StepExecutor::new(Arc::new(generator.clone())),
        PipelineConfig::default(),
    );
    let mut state = AnalysisState::new(input());
    state.fail("Planner error: backend unavailable: down");
    let before = state.clone();

    for kind in StepKind::ALL {
        state = orchestrator.run_node(kind, state).await;
    }

    assert_eq!(state, before);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn strategize_without_scores_is_precondition_failure() {
    let generator = structured_generator();
    let orchestrator = PipelineOrchestrator::new(
        StepExecutor::new(Arc::new(generator.clone())),
        PipelineConfig::default(),
    );

    let state = orchestrator
        .run_node(StepKind::Strategize, AnalysisState::new(input()))
        .await;

    assert_eq!(
        state.error.as_deref(),
        Some("Strategist error: precondition failed: risk_output is not available")
    );
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn panicking_progress_callback_does_not_affect_result() {
    let runner = PipelineRunner::new(Arc::new(structured_generator()));
    let callback = |_: &str, percent: u8| {
        if percent == 50 {
            panic!("progress bar crashed");
        }
    };

    let state = runner.run(input(), Some(&callback)).await;

    assert!(state.is_complete());
}
