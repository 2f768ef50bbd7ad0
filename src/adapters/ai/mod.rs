//! Text Generator Adapters.
//!
//! Implementations of the TextGenerator port.
//!
//! ## Available Adapters
//!
//! - `MockTextGenerator` - Scripted mock for testing
//! - `OpenAICompatibleGenerator` - OpenAI, Groq and Ollama chat-completions
//! - `provider_from_config` - Builds the adapter selected in `AiConfig`

mod factory;
mod mock_generator;
mod openai_compatible;

pub use factory::{generator_config, provider_from_config};
pub use mock_generator::{MockError, MockResponse, MockTextGenerator};
pub use openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleGenerator};
