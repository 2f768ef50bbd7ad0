//! StepExecutor - Runs one reasoning step against the text generator.
//!
//! Two strategies, in order:
//!
//! 1. **Native** - the request carries the step's response schema. Used only
//!    when the backend advertises structured output. An
//!    `UnsupportedCapability` answer drops to the next strategy.
//! 2. **Fallback** - formatting instructions and the rendered schema are
//!    appended to the prompt and the JSON object is recovered from free text.
//!
//! Whichever strategy produced it, the result is validated before it is
//! returned. No retries happen here; the backend adapter owns retry policy.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::agents::extraction::{extract_structured, from_value};
use crate::domain::agents::{StepError, StepOutput, StepRequest};
use crate::domain::foundation::RunId;
use crate::domain::schemas::{
    OpportunityOutput, PlannerOutput, Recommendation, ResearchOutput, RiskOutput, StructuredOutput,
};
use crate::ports::{
    GenerationRequest, GenerationResponse, MessageRole, RequestMetadata, ResponseSchema,
    TextGenerator,
};

/// Which strategy produced a step's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// The backend returned schema-constrained JSON.
    Native,
    /// A native reply had to be recovered from its text.
    NativeText,
    /// Free-text generation plus JSON recovery.
    Fallback,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStrategy::Native => "native",
            ExtractionStrategy::NativeText => "native_text",
            ExtractionStrategy::Fallback => "fallback",
        }
    }
}

/// Executes reasoning steps against a text generator.
pub struct StepExecutor {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl StepExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Runs the step described by `request` and returns its typed output.
    ///
    /// # Errors
    ///
    /// - `BackendUnavailable` if the generator fails for any reason other
    ///   than an unsupported capability or an unreadable reply
    /// - `ResponseFormat` if no strategy yields a valid result
    pub async fn execute(
        &self,
        run_id: RunId,
        request: StepRequest<'_>,
    ) -> Result<StepOutput, StepError> {
        let output = match request {
            StepRequest::Plan { .. } => {
                StepOutput::Plan(self.generate::<PlannerOutput>(run_id, &request).await?)
            }
            StepRequest::Research { .. } => {
                StepOutput::Research(self.generate::<ResearchOutput>(run_id, &request).await?)
            }
            StepRequest::Risk { .. } => {
                StepOutput::Risk(self.generate::<RiskOutput>(run_id, &request).await?)
            }
            StepRequest::Opportunity { .. } => StepOutput::Opportunity(
                self.generate::<OpportunityOutput>(run_id, &request).await?,
            ),
            StepRequest::Strategize { .. } => {
                StepOutput::Strategize(self.generate::<Recommendation>(run_id, &request).await?)
            }
        };
        Ok(output)
    }

    async fn generate<T: StructuredOutput>(
        &self,
        run_id: RunId,
        request: &StepRequest<'_>,
    ) -> Result<T, StepError> {
        let step = request.kind();

        if self.generator.provider_info().supports_structured_output {
            match self.native::<T>(run_id, request).await {
                Ok((value, strategy)) => {
                    debug!(%run_id, %step, strategy = strategy.as_str(), "step output extracted");
                    return Ok(value);
                }
                Err(NativeFailure::Unsupported(reason)) => {
                    debug!(%run_id, %step, %reason, "structured output unsupported, falling back");
                }
                Err(NativeFailure::Step(err)) => return Err(err),
            }
        }

        let value = self.fallback::<T>(run_id, request).await?;
        debug!(
            %run_id,
            %step,
            strategy = ExtractionStrategy::Fallback.as_str(),
            "step output extracted"
        );
        Ok(value)
    }

    async fn native<T: StructuredOutput>(
        &self,
        run_id: RunId,
        request: &StepRequest<'_>,
    ) -> Result<(T, ExtractionStrategy), NativeFailure> {
        let schema = T::output_schema();
        let generation = self
            .base_request(run_id, request, request.user_prompt())
            .with_response_schema(ResponseSchema::new(&schema.name, schema.to_json_schema()));

        let response = match self.generator.generate(generation).await {
            Ok(response) => response,
            Err(err) if err.is_unsupported_capability() => {
                return Err(NativeFailure::Unsupported(err.to_string()))
            }
            Err(err) => return Err(NativeFailure::Step(err.into())),
        };

        if let Some(value) = response.structured.clone() {
            match from_value::<T>(value) {
                Ok(parsed) => return Ok((parsed, ExtractionStrategy::Native)),
                Err(reason) => {
                    warn!(%run_id, step = %request.kind(), %reason, "structured result rejected");
                }
            }
        }

        // Same reply, no second call: recover the object from its text.
        extract_structured::<T>(&response.content)
            .map(|parsed| (parsed, ExtractionStrategy::NativeText))
            .map_err(NativeFailure::Step)
    }

    async fn fallback<T: StructuredOutput>(
        &self,
        run_id: RunId,
        request: &StepRequest<'_>,
    ) -> Result<T, StepError> {
        let prompt = format!(
            "{}\n\n{}",
            request.user_prompt(),
            T::output_schema().format_instructions()
        );
        let response: GenerationResponse = self
            .generator
            .generate(self.base_request(run_id, request, prompt))
            .await?;

        extract_structured::<T>(&response.content)
    }

    fn base_request(
        &self,
        run_id: RunId,
        request: &StepRequest<'_>,
        prompt: String,
    ) -> GenerationRequest {
        let mut generation = GenerationRequest::new(RequestMetadata::for_step(run_id, request.kind()))
            .with_system_prompt(request.system_prompt())
            .with_message(MessageRole::User, prompt)
            .with_temperature(self.temperature);
        if let Some(max) = self.max_tokens {
            generation = generation.with_max_tokens(max);
        }
        generation
    }
}

enum NativeFailure {
    Unsupported(String),
    Step(StepError),
}
