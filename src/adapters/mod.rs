//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Text-generation backends (OpenAI-compatible HTTP, scripted mock)
//! - `report` - Plain-text rendering of analysis results

pub mod ai;
pub mod report;

pub use ai::{provider_from_config, MockTextGenerator, OpenAICompatibleGenerator};
pub use report::ReportFormatter;
