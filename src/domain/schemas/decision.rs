//! The decision to be evaluated.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Minimum number of characters in the decision text.
pub const MIN_DECISION_LENGTH: usize = 10;

/// Prompt substitute when no context was supplied.
pub const DEFAULT_CONTEXT: &str = "No additional context provided";

/// Prompt substitute when no timeframe was supplied.
pub const DEFAULT_TIMEFRAME: &str = "Not specified";

/// A user's decision, immutable once constructed.
///
/// Deserialization goes through the same validation as [`DecisionInput::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DecisionInputRecord")]
pub struct DecisionInput {
    decision: String,
    context: Option<String>,
    timeframe: Option<String>,
}

#[derive(Deserialize)]
struct DecisionInputRecord {
    decision: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    timeframe: Option<String>,
}

impl TryFrom<DecisionInputRecord> for DecisionInput {
    type Error = ValidationError;

    fn try_from(record: DecisionInputRecord) -> Result<Self, Self::Error> {
        let input = Self::new(record.decision)?;
        Ok(input
            .with_context_opt(record.context)
            .with_timeframe_opt(record.timeframe))
    }
}

impl DecisionInput {
    /// Creates a decision input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `EmptyField` for blank text, `TooShort` below [`MIN_DECISION_LENGTH`].
    pub fn new(decision: impl Into<String>) -> Result<Self, ValidationError> {
        let decision = decision.into().trim().to_string();
        if decision.is_empty() {
            return Err(ValidationError::empty_field("decision"));
        }
        let length = decision.chars().count();
        if length < MIN_DECISION_LENGTH {
            return Err(ValidationError::too_short(
                "decision",
                MIN_DECISION_LENGTH,
                length,
            ));
        }
        Ok(Self {
            decision,
            context: None,
            timeframe: None,
        })
    }

    /// Sets free-text context. Blank text is treated as absent.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        self.with_context_opt(Some(context.into()))
    }

    /// Sets the expected timeframe. Blank text is treated as absent.
    pub fn with_timeframe(self, timeframe: impl Into<String>) -> Self {
        self.with_timeframe_opt(Some(timeframe.into()))
    }

    fn with_context_opt(mut self, context: Option<String>) -> Self {
        self.context = non_blank(context);
        self
    }

    fn with_timeframe_opt(mut self, timeframe: Option<String>) -> Self {
        self.timeframe = non_blank(timeframe);
        self
    }

    pub fn decision(&self) -> &str {
        &self.decision
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn timeframe(&self) -> Option<&str> {
        self.timeframe.as_deref()
    }

    /// Context for prompt rendering.
    pub fn context_or_default(&self) -> &str {
        self.context().unwrap_or(DEFAULT_CONTEXT)
    }

    /// Timeframe for prompt rendering.
    pub fn timeframe_or_default(&self) -> &str {
        self.timeframe().unwrap_or(DEFAULT_TIMEFRAME)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
