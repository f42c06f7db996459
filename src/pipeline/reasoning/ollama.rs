use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{check_status, map_transport_error, LlmClient, ReasoningError};
use crate::config::ConfigError;

pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "medgemma";

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at a local Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    /// Default Ollama instance at localhost:11434.
    pub fn default_local(timeout_secs: u64) -> Result<Self, ConfigError> {
        Self::new(OLLAMA_DEFAULT_BASE_URL, timeout_secs)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    format: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl LlmClient for OllamaClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, ReasoningError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model,
            prompt,
            system,
            format: "json",
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;
        let response = check_status(response)?;

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| ReasoningError::ResponseParsing(e.to_string()))?;

        if parsed.response.trim().is_empty() {
            return Err(ReasoningError::EmptyResponse);
        }
        Ok(parsed.response)
    }

    fn list_models(&self) -> Result<Vec<String>, ReasoningError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;
        let response = check_status(response)?;

        let parsed: OllamaTagsResponse = response
            .json()
            .map_err(|e| ReasoningError::ResponseParsing(e.to_string()))?;

        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}
