//! Errors surfaced by the pipeline runner.

use thiserror::Error;

/// Failure of a whole run, as seen by `get_recommendation` callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// A step failed; carries the message stored on the state.
    #[error("Workflow error: {message}")]
    Failed { message: String },

    /// The run ended without error but produced no recommendation.
    #[error("pipeline finished without a recommendation")]
    MissingRecommendation,
}

impl PipelineError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
