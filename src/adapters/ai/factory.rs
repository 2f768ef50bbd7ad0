//! Builds the configured text-generation backend.

use std::sync::Arc;

use crate::config::{AiConfig, AiProvider};
use crate::ports::{GenerationError, TextGenerator};

use super::openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleGenerator};

/// Adapter configuration for the selected provider.
pub fn generator_config(config: &AiConfig) -> OpenAICompatibleConfig {
    let mut generator = OpenAICompatibleConfig::new(config.provider.as_str(), config.endpoint())
        .with_model(config.model())
        .with_timeout(config.timeout())
        .with_max_retries(config.max_retries)
        .with_structured_output(config.structured_output);

    let key = match config.provider {
        AiProvider::OpenAI => config.openai_api_key.as_deref(),
        AiProvider::Groq => config.groq_api_key.as_deref(),
        AiProvider::Ollama => None,
    };
    if let Some(key) = key.filter(|k| !k.is_empty()) {
        generator = generator.with_api_key(key);
    }
    generator
}

/// Creates the backend adapter for `config.provider`.
///
/// # Errors
///
/// `AuthenticationFailed` when a hosted provider has no key, or whatever
/// the HTTP client construction reports.
pub fn provider_from_config(config: &AiConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let generator_config = generator_config(config);
    if config.provider != AiProvider::Ollama && !generator_config.has_api_key() {
        return Err(GenerationError::AuthenticationFailed);
    }
    Ok(Arc::new(OpenAICompatibleGenerator::new(generator_config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn groq_config_uses_groq_key_and_endpoint() {
        let config = AiConfig {
            groq_api_key: Some("gsk-1".to_string()),
            openai_api_key: Some("sk-1".to_string()),
            timeout_secs: 42,
            ..Default::default()
        };

        let generator = generator_config(&config);
        assert_eq!(generator.provider, "groq");
        assert_eq!(generator.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(generator.model, "llama-3.3-70b-versatile");
        assert_eq!(generator.timeout, Duration::from_secs(42));
        assert!(generator.has_api_key());
    }

    #[test]
    fn ollama_config_has_no_key() {
        let config = AiConfig {
            provider: AiProvider::Ollama,
            openai_api_key: Some("sk-1".to_string()),
            ..Default::default()
        };
        assert!(!generator_config(&config).has_api_key());
        assert!(provider_from_config(&config).is_ok());
    }

    #[test]
    fn hosted_provider_without_key_is_rejected() {
        let config = AiConfig {
            provider: AiProvider::OpenAI,
            openai_api_key: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            provider_from_config(&config).err(),
            Some(GenerationError::AuthenticationFailed)
        );
    }

    #[test]
    fn built_provider_reports_selection() {
        let config = AiConfig {
            provider: AiProvider::OpenAI,
            openai_api_key: Some("sk-1".to_string()),
            structured_output: false,
            ..Default::default()
        };
        let info = provider_from_config(&config).unwrap().provider_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o-mini");
        assert!(!info.supports_structured_output);
    }
}
