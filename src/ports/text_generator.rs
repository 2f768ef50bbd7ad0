//! Text Generator Port - Interface for text-generation backends.
//!
//! This port abstracts the single capability the pipeline consumes: turn a
//! prompt (and optionally a response schema) into generated text. Adapters
//! translate to a concrete chat-completions API.
//!
//! # Design
//!
//! - A request may carry a [`ResponseSchema`]; backends that can constrain
//!   output natively honor it, others answer with
//!   [`GenerationError::UnsupportedCapability`] so the caller can fall back
//! - [`ProviderInfo::supports_structured_output`] lets callers skip the
//!   native attempt when the backend is known not to support it
//! - Error types separate transient failures (retryable) from permanent ones
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoGenerator;
//!
//! #[async_trait]
//! impl TextGenerator for EchoGenerator {
//!     async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
//!         Ok(GenerationResponse::text("{}", "echo"))
//!     }
//!
//!     fn provider_info(&self) -> ProviderInfo {
//!         ProviderInfo::new("echo", "echo-1")
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::agents::{StepError, StepKind};
use crate::domain::foundation::RunId;

/// Port for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a single completion.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError>;

    /// Provider name, model and capabilities.
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a completion.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Conversation messages, usually a single user prompt.
    pub messages: Vec<Message>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature (0.0 = deterministic).
    pub temperature: Option<f32>,
    /// When set, ask the backend to constrain output to this schema.
    pub response_schema: Option<ResponseSchema>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl GenerationRequest {
    /// Creates an empty request with the given metadata.
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            response_schema: None,
            metadata,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Requests native structured output.
    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Content of the last user message, if any.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Named JSON schema for native structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Pipeline run this call belongs to.
    pub run_id: RunId,
    /// Step issuing the call, if any.
    pub step: Option<StepKind>,
    /// Trace ID for distributed tracing.
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(run_id: RunId, trace_id: impl Into<String>) -> Self {
        Self {
            run_id,
            step: None,
            trace_id: trace_id.into(),
        }
    }

    /// Metadata for a call made by a pipeline step.
    pub fn for_step(run_id: RunId, step: StepKind) -> Self {
        Self {
            run_id,
            step: Some(step),
            trace_id: format!("{}:{}", run_id, step),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text.
    pub content: String,
    /// Parsed JSON when the backend honored a response schema.
    pub structured: Option<Value>,
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
    pub finish_reason: FinishReason,
}

impl GenerationResponse {
    /// A plain text response.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            structured: None,
            usage: TokenUsage::zero(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// A schema-constrained response; `content` is the serialized JSON.
    pub fn structured(value: Value, model: impl Into<String>) -> Self {
        Self {
            content: value.to_string(),
            structured: Some(value),
            usage: TokenUsage::zero(),
            model: model.into(),
            finish_reason: FinishReason::Stop,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Content was filtered for safety.
    ContentFilter,
    /// An error occurred.
    Error,
}

/// Provider information and capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "groq").
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Whether schema-constrained output can be requested.
    pub supports_structured_output: bool,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            supports_structured_output: false,
        }
    }

    /// Sets structured output support.
    pub fn with_structured_output(mut self, supports: bool) -> Self {
        self.supports_structured_output = supports;
        self
    }
}

/// Text generation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// The backend cannot honor a requested capability (e.g. response schemas).
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),
}

impl GenerationError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability(capability.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }

    /// Returns true if the caller should fall back to plain text generation.
    pub fn is_unsupported_capability(&self) -> bool {
        matches!(self, GenerationError::UnsupportedCapability(_))
    }
}

/// Every backend failure that reaches a step is fatal for that step. A reply
/// that arrived but could not be read is a format failure, anything else
/// means the backend was not usable.
impl From<GenerationError> for StepError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Parse(message) => {
                StepError::response_format("backend reply could not be parsed", &message)
            }
            other => StepError::backend_unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> RequestMetadata {
        RequestMetadata::for_step(RunId::new(), StepKind::Risk)
    }

    #[test]
    fn request_builder_works() {
        let request = GenerationRequest::new(metadata())
            .with_message(MessageRole::User, "Hello")
            .with_system_prompt("Be helpful")
            .with_max_tokens(100)
            .with_temperature(0.0)
            .with_response_schema(ResponseSchema::new("Thing", json!({"type": "object"})));

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.system_prompt.as_deref(), Some("Be helpful"));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.response_schema.unwrap().name, "Thing");
    }

    #[test]
    fn last_user_message_skips_other_roles() {
        let request = GenerationRequest::new(metadata())
            .with_message(MessageRole::User, "first")
            .with_message(MessageRole::Assistant, "reply")
            .with_message(MessageRole::User, "second");
        assert_eq!(request.last_user_message(), Some("second"));
    }

    #[test]
    fn step_metadata_builds_trace_id() {
        let run_id = RunId::new();
        let meta = RequestMetadata::for_step(run_id, StepKind::Plan);
        assert_eq!(meta.step, Some(StepKind::Plan));
        assert_eq!(meta.trace_id, format!("{}:plan", run_id));
    }

    #[test]
    fn structured_response_serializes_content() {
        let response = GenerationResponse::structured(json!({"a": 1}), "m");
        assert_eq!(response.content, r#"{"a":1}"#);
        assert_eq!(response.structured, Some(json!({"a": 1})));
    }

    #[test]
    fn token_usage_calculates_total() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(TokenUsage::zero().total_tokens, 0);
    }

    #[test]
    fn provider_info_defaults_to_no_structured_output() {
        let info = ProviderInfo::new("ollama", "llama3");
        assert!(!info.supports_structured_output);
        assert!(info.with_structured_output(true).supports_structured_output);
    }

    #[test]
    fn retryable_classification() {
        assert!(GenerationError::rate_limited(30).is_retryable());
        assert!(GenerationError::unavailable("down").is_retryable());
        assert!(GenerationError::network("reset").is_retryable());
        assert!(GenerationError::Timeout { timeout_secs: 30 }.is_retryable());

        assert!(!GenerationError::AuthenticationFailed.is_retryable());
        assert!(!GenerationError::content_filtered("bad").is_retryable());
        assert!(!GenerationError::unsupported("json_schema").is_retryable());
    }

    #[test]
    fn unsupported_capability_is_flagged() {
        assert!(GenerationError::unsupported("json_schema").is_unsupported_capability());
        assert!(!GenerationError::parse("bad").is_unsupported_capability());
    }

    #[test]
    fn generation_errors_become_backend_unavailable() {
        let err: StepError = GenerationError::Timeout { timeout_secs: 300 }.into();
        assert_eq!(
            err,
            StepError::BackendUnavailable("request timed out after 300s".to_string())
        );
    }

    #[test]
    fn unreadable_reply_becomes_response_format() {
        let err: StepError = GenerationError::parse("No choices in response").into();
        assert_eq!(
            err,
            StepError::ResponseFormat {
                reason: "backend reply could not be parsed".to_string(),
                raw_excerpt: "No choices in response".to_string(),
            }
        );
    }

    #[test]
    fn error_displays_correctly() {
        assert_eq!(
            GenerationError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            GenerationError::unsupported("response_format").to_string(),
            "unsupported capability: response_format"
        );
    }

    #[test]
    fn finish_reason_serializes_snake_case() {
        let json = serde_json::to_string(&FinishReason::ContentFilter).unwrap();
        assert_eq!(json, "\"content_filter\"");
    }
}
