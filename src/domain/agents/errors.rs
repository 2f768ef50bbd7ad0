//! Errors raised by a single reasoning step.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Characters of raw backend text kept on a format failure.
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Failure of one pipeline step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    /// Inputs to the step were malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The backend could not be reached or refused the request.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend replied but nothing in the reply matched the schema.
    #[error("response format error: {reason}. Raw response: {raw_excerpt}")]
    ResponseFormat { reason: String, raw_excerpt: String },

    /// A required upstream output is missing from the state.
    #[error("precondition failed: {0}")]
    PipelinePrecondition(String),
}

impl StepError {
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable(message.into())
    }

    /// Creates a format error carrying the head of the raw response.
    pub fn response_format(reason: impl Into<String>, raw: &str) -> Self {
        Self::ResponseFormat {
            reason: reason.into(),
            raw_excerpt: excerpt(raw, RAW_EXCERPT_CHARS),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PipelinePrecondition(message.into())
    }
}

/// First `max` characters of `input`, never splitting a character.
pub fn excerpt(input: &str, max: usize) -> String {
    match input.char_indices().nth(max) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}
