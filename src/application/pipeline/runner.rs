//! PipelineRunner - Public entry point for analysing a decision.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::application::steps::StepExecutor;
use crate::config::PipelineConfig;
use crate::domain::schemas::{AnalysisState, DecisionInput, Recommendation};
use crate::ports::TextGenerator;

use super::errors::PipelineError;
use super::orchestrator::PipelineOrchestrator;
use super::progress::ProgressCallback;

/// Runs whole analyses. Holds no per-run state, so one runner can serve
/// many concurrent runs.
pub struct PipelineRunner {
    generator: Arc<dyn TextGenerator>,
    config: PipelineConfig,
    temperature: f32,
}

impl PipelineRunner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            config: PipelineConfig::default(),
            temperature: 0.0,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn orchestrator(&self) -> PipelineOrchestrator {
        let executor = StepExecutor::new(Arc::clone(&self.generator))
            .with_temperature(self.temperature)
            .with_max_tokens(self.config.max_tokens);
        PipelineOrchestrator::new(executor, self.config.clone())
    }

    /// Analyses `input` and returns the final state.
    ///
    /// Never fails: a step failure is reported through `state.error`.
    pub async fn run(
        &self,
        input: DecisionInput,
        progress: Option<&dyn ProgressCallback>,
    ) -> AnalysisState {
        let state = AnalysisState::new(input);
        let run_id = state.run_id;
        let provider = self.generator.provider_info();
        info!(
            %run_id,
            provider = %provider.name,
            model = %provider.model,
            parallel_scoring = self.config.parallel_scoring,
            "starting analysis"
        );

        let started = Instant::now();
        let state = self.orchestrator().run(state, progress).await;

        info!(
            %run_id,
            step = %state.current_step,
            failed = state.has_error(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis finished"
        );
        state
    }

    /// Runs the pipeline and returns only the recommendation.
    ///
    /// # Errors
    ///
    /// - `Failed` when any step failed; the message is the state's error
    /// - `MissingRecommendation` if the run ended without one
    pub async fn get_recommendation(
        &self,
        input: DecisionInput,
    ) -> Result<Recommendation, PipelineError> {
        let state = self.run(input, None).await;
        if let Some(error) = state.error {
            return Err(PipelineError::failed(error));
        }
        state
            .recommendation
            .ok_or(PipelineError::MissingRecommendation)
    }
}
