//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DECISION_ADVISOR` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use decision_advisor::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Using {} / {}", config.ai.provider, config.ai.model());
//! ```

mod ai;
mod error;
mod logging;
mod pipeline;

pub use ai::{AiConfig, AiProvider};
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::PipelineConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the API key of a hosted provider is
/// required. Load using [`AppConfig::load()`] which reads from environment
/// variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Text-generation backend (OpenAI/Groq/Ollama)
    #[serde(default)]
    pub ai: AiConfig,

    /// Pipeline behaviour
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Tracing subscriber setup
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DECISION_ADVISOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DECISION_ADVISOR__AI__PROVIDER=ollama` -> `ai.provider = ollama`
    /// - `DECISION_ADVISOR__PIPELINE__PARALLEL_SCORING=true` -> `pipeline.parallel_scoring = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECISION_ADVISOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.pipeline.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
