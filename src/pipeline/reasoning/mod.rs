pub mod config;
pub mod gemini;
pub mod mock;
pub mod ollama;

pub use config::*;
pub use gemini::*;
pub use mock::*;
pub use ollama::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReasoningError {
    #[error("Reasoning service is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Reasoning service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Reasoning service returned no content")]
    EmptyResponse,

    #[error("Reasoning call interrupted: {0}")]
    Interrupted(String),
}

/// Text-generation backend abstraction (allows mocking).
pub trait LlmClient {
    /// Generate a completion. Backends are asked for JSON-only output.
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, ReasoningError>;

    fn list_models(&self) -> Result<Vec<String>, ReasoningError>;

    fn is_model_available(&self, model: &str) -> Result<bool, ReasoningError> {
        let models = self.list_models()?;
        Ok(models.iter().any(|m| m.starts_with(model)))
    }
}

/// Map a transport-level reqwest failure onto the error taxonomy.
pub(crate) fn map_transport_error(
    e: reqwest::Error,
    base_url: &str,
    timeout_secs: u64,
) -> ReasoningError {
    if e.is_timeout() {
        ReasoningError::Timeout(timeout_secs)
    } else if e.is_connect() {
        ReasoningError::Connection(base_url.to_string())
    } else {
        ReasoningError::HttpClient(e.to_string())
    }
}

/// Turn a non-success response into `ReasoningError::Status`.
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ReasoningError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ReasoningError::Status {
        status: status.as_u16(),
        body,
    })
}
