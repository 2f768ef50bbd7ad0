//! Pipeline behaviour configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Knobs for a pipeline run
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Run the Risk and Opportunity backend calls concurrently
    #[serde(default)]
    pub parallel_scoring: bool,

    /// Cap forwarded to the backend for every step
    pub max_tokens: Option<u32>,

    /// Recompute overall levels from per-factor scores
    #[serde(default = "default_deterministic_aggregation")]
    pub deterministic_aggregation: bool,
}

impl PipelineConfig {
    pub fn with_parallel_scoring(mut self, enabled: bool) -> Self {
        self.parallel_scoring = enabled;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_deterministic_aggregation(mut self, enabled: bool) -> Self {
        self.deterministic_aggregation = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_tokens == Some(0) {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_scoring: false,
            max_tokens: None,
            deterministic_aggregation: default_deterministic_aggregation(),
        }
    }
}

fn default_deterministic_aggregation() -> bool {
    true
}
