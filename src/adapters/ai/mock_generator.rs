//! Mock Text Generator for testing.
//!
//! Provides a scripted implementation of the TextGenerator port, allowing
//! pipeline tests to run without calling a real backend.
//!
//! # Features
//!
//! - Pre-configured text or structured responses, consumed in order
//! - Simulated delays for concurrency testing
//! - Error injection, including unsupported-capability signalling
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockTextGenerator::new()
//!     .with_structured_output(false)
//!     .with_text(r#"{"factors": [...], "decision_summary": "..."}"#);
//!
//! let response = generator.generate(request).await?;
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    GenerationError, GenerationRequest, GenerationResponse, ProviderInfo, TextGenerator,
    TokenUsage,
};

/// Mock text generator for testing.
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return free text.
    Text(String),
    /// Return a schema-constrained JSON value.
    Structured(Value),
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
    ContentFiltered { reason: String },
    /// Simulate a reply the adapter could not read.
    Parse { message: String },
    /// Simulate a backend that rejects response schemas.
    Unsupported { capability: String },
}

impl From<MockError> for GenerationError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                GenerationError::rate_limited(retry_after_secs)
            }
            MockError::Unavailable { message } => GenerationError::unavailable(message),
            MockError::AuthenticationFailed => GenerationError::AuthenticationFailed,
            MockError::Network { message } => GenerationError::network(message),
            MockError::Timeout { timeout_secs } => GenerationError::Timeout { timeout_secs },
            MockError::ContentFiltered { reason } => GenerationError::content_filtered(reason),
            MockError::Parse { message } => GenerationError::parse(message),
            MockError::Unsupported { capability } => GenerationError::unsupported(capability),
        }
    }
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTextGenerator {
    /// Creates a mock that claims structured output support.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1").with_structured_output(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a free-text response to the queue.
    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Text(content.into()))
    }

    /// Adds a structured response to the queue.
    pub fn with_structured(self, value: Value) -> Self {
        self.push(MockResponse::Structured(value))
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    fn push(self, response: MockResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    /// Sets whether the provider advertises structured output.
    pub fn with_structured_output(mut self, supports: bool) -> Self {
        self.info = self.info.with_structured_output(supports);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this generator.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    /// Returns the number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Text("Mock response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let usage = TokenUsage::new(10, 20);
        match self.next_response() {
            MockResponse::Text(content) => {
                Ok(GenerationResponse::text(content, &self.info.model).with_usage(usage))
            }
            MockResponse::Structured(value) => {
                Ok(GenerationResponse::structured(value, &self.info.model).with_usage(usage))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
