//! Text-generation backend configuration

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::error::ValidationError;

/// Text-generation backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Backend to use
    #[serde(default)]
    pub provider: AiProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Groq API key
    pub groq_api_key: Option<String>,

    /// Model override; each provider has its own default
    pub model: Option<String>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Endpoint override for the selected provider
    pub base_url: Option<String>,

    /// Ollama server root (without `/v1`)
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Ask the backend for schema-constrained output
    #[serde(default = "default_structured_output")]
    pub structured_output: bool,
}

/// Text-generation backend type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    OpenAI,
    #[default]
    Groq,
    Ollama,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "openai",
            AiProvider::Groq => "groq",
            AiProvider::Ollama => "ollama",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::OpenAI => "gpt-4o-mini",
            AiProvider::Groq => "llama-3.3-70b-versatile",
            AiProvider::Ollama => "llama3.1",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured model, or the provider's default
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if Groq is configured
    pub fn has_groq(&self) -> bool {
        self.groq_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Chat-completions root for the selected provider
    pub fn endpoint(&self) -> String {
        if let Some(url) = self.base_url.as_ref().filter(|u| !u.is_empty()) {
            return url.clone();
        }
        match self.provider {
            AiProvider::OpenAI => "https://api.openai.com/v1".to_string(),
            AiProvider::Groq => "https://api.groq.com/openai/v1".to_string(),
            AiProvider::Ollama => format!("{}/v1", self.ollama_base_url.trim_end_matches('/')),
        }
    }

    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            AiProvider::OpenAI if !self.has_openai() => {
                return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
            }
            AiProvider::Groq if !self.has_groq() => {
                return Err(ValidationError::MissingRequired("GROQ_API_KEY"));
            }
            _ => {}
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature(self.temperature));
        }

        let endpoint = self.endpoint();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl(endpoint));
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            openai_api_key: None,
            groq_api_key: None,
            model: None,
            temperature: 0.0,
            base_url: None,
            ollama_base_url: default_ollama_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            structured_output: default_structured_output(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_retries() -> u32 {
    3
}

fn default_structured_output() -> bool {
    true
}
