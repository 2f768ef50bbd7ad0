//! OpenAI-compatible Generator - TextGenerator over the chat-completions API.
//!
//! OpenAI, Groq and Ollama (under `/v1`) all speak the same protocol, so one
//! adapter serves them; only the base URL, key and model differ.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAICompatibleConfig::new("groq", "https://api.groq.com/openai/v1")
//!     .with_api_key(api_key)
//!     .with_model("llama-3.3-70b-versatile");
//!
//! let generator = OpenAICompatibleGenerator::new(config)?;
//! ```
//!
//! # Structured output
//!
//! When a request carries a [`ResponseSchema`] it is sent as
//! `response_format: {type: "json_schema"}`. Backends that reject the field
//! answer 400, which is surfaced as [`GenerationError::UnsupportedCapability`].

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::{
    FinishReason, GenerationError, GenerationRequest, GenerationResponse, MessageRole,
    ProviderInfo, ResponseSchema, TextGenerator, TokenUsage,
};

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAICompatibleConfig {
    /// Provider name reported in [`ProviderInfo`].
    pub provider: String,
    /// API key; local servers such as Ollama need none.
    api_key: Option<Secret<String>>,
    /// Model to use.
    pub model: String,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Whether to send `response_format` for schema-carrying requests.
    pub structured_output: bool,
}

impl OpenAICompatibleConfig {
    /// Creates a configuration for the given provider and endpoint.
    pub fn new(provider: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(300),
            max_retries: 3,
            structured_output: true,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(api_key.into()));
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Enables or disables native structured output.
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// Chat-completions backend implementation.
pub struct OpenAICompatibleGenerator {
    config: OpenAICompatibleConfig,
    client: Client,
}

impl OpenAICompatibleGenerator {
    /// Creates a generator with the given configuration.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the HTTP client cannot be constructed.
    pub fn new(config: OpenAICompatibleConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                GenerationError::InvalidRequest(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Whether this request will ask for native structured output.
    fn wants_structured(&self, request: &GenerationRequest) -> bool {
        self.config.structured_output && request.response_schema.is_some()
    }

    /// Converts our request to the wire format.
    fn to_wire_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: prompt.clone(),
            });
        }

        for msg in &request.messages {
            messages.push(ChatMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        let response_format = if self.wants_structured(request) {
            request.response_schema.as_ref().map(ResponseFormat::json_schema)
        } else {
            None
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }

    /// Sends a request and maps transport failures.
    async fn send_request(&self, request: &GenerationRequest) -> Result<Response, GenerationError> {
        let body = self.to_wire_request(request);

        let mut builder = self
            .client
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = self.config.api_key() {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout {
                    timeout_secs: self.config.timeout.as_secs() as u32,
                }
            } else if e.is_connect() {
                GenerationError::network(format!("Connection failed: {}", e))
            } else {
                GenerationError::network(e.to_string())
            }
        })
    }

    /// Reads the body and maps non-success statuses.
    async fn read_body(
        &self,
        response: Response,
        structured: bool,
    ) -> Result<String, GenerationError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok(body);
        }
        Err(Self::status_error(status.as_u16(), &body, structured))
    }

    /// Maps an HTTP error status to a generation error.
    fn status_error(status: u16, body: &str, structured: bool) -> GenerationError {
        match status {
            401 | 403 => GenerationError::AuthenticationFailed,
            429 => GenerationError::rate_limited(Self::parse_retry_after(body)),
            400 | 422 => {
                if structured && (body.contains("response_format") || body.contains("json_schema"))
                {
                    GenerationError::unsupported("response_format json_schema")
                } else {
                    GenerationError::InvalidRequest(body.to_string())
                }
            }
            500..=599 => GenerationError::unavailable(format!("Server error {}: {}", status, body)),
            _ => GenerationError::network(format!("Unexpected status {}: {}", status, body)),
        }
    }

    /// Parses retry-after from an error body.
    fn parse_retry_after(error_body: &str) -> u32 {
        // Providers put "try again in Ns" in the error message; default 30s.
        let message = serde_json::from_str::<Value>(error_body).ok().and_then(|parsed| {
            parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });

        if let Some(msg) = message {
            if let Some(idx) = msg.find("try again in ") {
                let rest = &msg[idx + 13..];
                let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
                if let Ok(secs) = rest[..end].parse::<u32>() {
                    return secs;
                }
            }
        }
        30
    }

    /// Parses a successful response body.
    fn parse_body(&self, body: &str, structured: bool) -> Result<GenerationResponse, GenerationError> {
        let response: ChatResponse = serde_json::from_str(body)
            .map_err(|e| GenerationError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = choice.message.content.unwrap_or_default();

        // A reply that doesn't parse is left for the caller's text extraction.
        let parsed = if structured {
            match serde_json::from_str::<Value>(&content) {
                Ok(value) if value.is_object() => Some(value),
                _ => {
                    debug!(model = %response.model, "structured reply was not a JSON object");
                    None
                }
            }
        } else {
            None
        };

        Ok(GenerationResponse {
            content,
            structured: parsed,
            usage,
            model: response.model,
            finish_reason,
        })
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let structured = self.wants_structured(request);
        let response = self.send_request(request).await?;
        let body = self.read_body(response, structured).await?;
        self.parse_body(&body, structured)
    }
}

#[async_trait]
impl TextGenerator for OpenAICompatibleGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(&request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if !err.is_retryable() || retry_count >= self.config.max_retries {
                        return Err(err);
                    }
                    warn!(
                        provider = %self.config.provider,
                        attempt = retry_count + 1,
                        error = %err,
                        "retrying generation request"
                    );
                }
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let delay = Duration::from_secs(1 << retry_count.min(6));
            sleep(delay).await;
            retry_count += 1;
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.config.provider, &self.config.model)
            .with_structured_output(self.config.structured_output)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

impl ResponseFormat {
    fn json_schema(schema: &ResponseSchema) -> Self {
        Self {
            kind: "json_schema",
            json_schema: JsonSchemaFormat {
                name: schema.name.clone(),
                schema: schema.schema.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agents::StepKind;
    use crate::domain::foundation::RunId;
    use crate::ports::RequestMetadata;
    use serde_json::json;

    fn generator(structured: bool) -> OpenAICompatibleGenerator {
        OpenAICompatibleGenerator::new(
            OpenAICompatibleConfig::new("groq", "https://api.groq.com/openai/v1/")
                .with_api_key("test-key")
                .with_model("llama-3.3-70b-versatile")
                .with_structured_output(structured),
        )
        .unwrap()
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new(RequestMetadata::for_step(RunId::new(), StepKind::Plan))
            .with_system_prompt("You are a planner")
            .with_message(MessageRole::User, "Decide")
            .with_temperature(0.0)
    }

    fn schema_request() -> GenerationRequest {
        request().with_response_schema(ResponseSchema::new(
            "PlannerOutput",
            json!({"type": "object"}),
        ))
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAICompatibleConfig::new("openai", "https://api.openai.com/v1")
            .with_api_key("sk-test")
            .with_model("gpt-4o")
            .with_timeout(Duration::from_secs(30))
            .with_max_retries(5)
            .with_structured_output(false);

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 5);
        assert!(!config.structured_output);
        assert_eq!(config.api_key(), Some("sk-test"));
    }

    #[test]
    fn api_key_is_not_debug_printed() {
        let config = OpenAICompatibleConfig::new("openai", "x").with_api_key("sk-secret");
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }

    #[test]
    fn completions_url_trims_trailing_slash() {
        assert_eq!(
            generator(true).completions_url(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn wire_request_puts_system_prompt_first() {
        let wire = generator(true).to_wire_request(&request());
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].content, "Decide");
        assert!(wire.response_format.is_none());
    }

    #[test]
    fn wire_request_carries_json_schema() {
        let wire = serde_json::to_value(generator(true).to_wire_request(&schema_request())).unwrap();
        assert_eq!(wire["response_format"]["type"], "json_schema");
        assert_eq!(wire["response_format"]["json_schema"]["name"], "PlannerOutput");
        assert!(wire.get("max_tokens").is_none());
    }

    #[test]
    fn disabled_structured_output_omits_schema() {
        let wire = generator(false).to_wire_request(&schema_request());
        assert!(wire.response_format.is_none());
    }

    #[test]
    fn provider_info_reflects_config() {
        let info = generator(false).provider_info();
        assert_eq!(info.name, "groq");
        assert_eq!(info.model, "llama-3.3-70b-versatile");
        assert!(!info.supports_structured_output);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            OpenAICompatibleGenerator::status_error(401, "", false),
            GenerationError::AuthenticationFailed
        );
        assert_eq!(
            OpenAICompatibleGenerator::status_error(429, "{}", false),
            GenerationError::rate_limited(30)
        );
        assert!(matches!(
            OpenAICompatibleGenerator::status_error(503, "down", false),
            GenerationError::Unavailable { .. }
        ));
        assert!(matches!(
            OpenAICompatibleGenerator::status_error(418, "teapot", false),
            GenerationError::Network(_)
        ));
    }

    #[test]
    fn rejected_response_format_is_unsupported_capability() {
        let body = r#"{"error":{"message":"response_format `json_schema` is not supported"}}"#;
        assert!(OpenAICompatibleGenerator::status_error(400, body, true).is_unsupported_capability());
        // without a schema in the request the same body is a plain bad request
        assert!(matches!(
            OpenAICompatibleGenerator::status_error(400, body, false),
            GenerationError::InvalidRequest(_)
        ));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let body = r#"{"error":{"message":"Rate limit reached. Please try again in 12s."}}"#;
        assert_eq!(OpenAICompatibleGenerator::parse_retry_after(body), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(OpenAICompatibleGenerator::parse_retry_after("not json"), 30);
    }

    #[test]
    fn parse_body_extracts_structured_object() {
        let body = json!({
            "model": "llama",
            "choices": [{"message": {"content": "{\"a\": 1}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7}
        })
        .to_string();

        let response = generator(true).parse_body(&body, true).unwrap();
        assert_eq!(response.structured, Some(json!({"a": 1})));
        assert_eq!(response.usage.total_tokens, 12);
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn parse_body_leaves_prose_unstructured() {
        let body = json!({
            "model": "llama",
            "choices": [{"message": {"content": "Here: {\"a\": 1}"}, "finish_reason": "length"}]
        })
        .to_string();

        let response = generator(true).parse_body(&body, true).unwrap();
        assert!(response.structured.is_none());
        assert_eq!(response.content, "Here: {\"a\": 1}");
        assert_eq!(response.finish_reason, FinishReason::Length);
    }

    #[test]
    fn parse_body_without_choices_fails() {
        let body = json!({"model": "m", "choices": []}).to_string();
        assert!(matches!(
            generator(true).parse_body(&body, false),
            Err(GenerationError::Parse(_))
        ));
    }
}
