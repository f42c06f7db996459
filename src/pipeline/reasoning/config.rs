use serde::Serialize;

use super::gemini::{GeminiClient, GEMINI_DEFAULT_BASE_URL, GEMINI_DEFAULT_MODEL};
use super::ollama::{OllamaClient, OLLAMA_DEFAULT_BASE_URL, OLLAMA_DEFAULT_MODEL};
use super::LlmClient;
use crate::config::{env_keys, ConfigError};
use crate::pipeline::report::reasoning_response_schema;

/// Default HTTP timeout for one reasoning call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Gemini,
    Ollama,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_MODEL,
            Self::Ollama => OLLAMA_DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_DEFAULT_BASE_URL,
            Self::Ollama => OLLAMA_DEFAULT_BASE_URL,
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: env_keys::BACKEND.into(),
                value: s.into(),
            }),
        }
    }
}

/// Settings for the reasoning collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningConfig {
    pub backend: Backend,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ReasoningConfig {
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            base_url: backend.default_base_url().to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
        }
    }

    /// Build from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get(env_keys::BACKEND) {
            Some(v) => v.parse()?,
            None => Backend::Gemini,
        };
        let mut config = Self::for_backend(backend);

        if let Some(model) = get(env_keys::MODEL) {
            config.model = model;
        }
        if let Some(url) = get(env_keys::BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = get(env_keys::TIMEOUT_SECS) {
            config.timeout_secs = match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: env_keys::TIMEOUT_SECS.into(),
                        value: raw,
                    })
                }
            };
        }
        config.api_key = get(env_keys::GEMINI_API_KEY);
        Ok(config)
    }

    /// Construct the HTTP client for the configured backend.
    ///
    /// Fails before any analysis runs if Gemini is selected without a key.
    pub fn build_client(&self) -> Result<Box<dyn LlmClient + Send + Sync>, ConfigError> {
        match self.backend {
            Backend::Gemini => {
                let key = self
                    .api_key
                    .as_deref()
                    .ok_or(ConfigError::MissingApiKey(env_keys::GEMINI_API_KEY))?;
                let client = GeminiClient::new(&self.base_url, key, self.timeout_secs)?
                    .with_response_schema(reasoning_response_schema());
                Ok(Box::new(client))
            }
            Backend::Ollama => Ok(Box::new(OllamaClient::new(
                &self.base_url,
                self.timeout_secs,
            )?)),
        }
    }
}
