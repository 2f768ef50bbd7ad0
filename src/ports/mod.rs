//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `TextGenerator` - The text-generation backend every reasoning step calls

mod text_generator;

pub use text_generator::{
    FinishReason, GenerationError, GenerationRequest, GenerationResponse, Message, MessageRole,
    ProviderInfo, RequestMetadata, ResponseSchema, TextGenerator, TokenUsage,
};
