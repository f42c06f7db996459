use std::sync::atomic::{AtomicUsize, Ordering};

use super::{LlmClient, ReasoningError};

type Responder = dyn Fn(&str) -> Result<String, ReasoningError> + Send + Sync;

/// Mock LLM client for testing. Answers from a closure over the prompt.
pub struct MockLlmClient {
    responder: Box<Responder>,
    available_models: Vec<String>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    /// Always returns `response`.
    pub fn new(response: &str) -> Self {
        let response = response.to_string();
        Self::with_responder(move |_| Ok(response.clone()))
    }

    /// Always fails with a timeout.
    pub fn timing_out(timeout_secs: u64) -> Self {
        Self::with_responder(move |_| Err(ReasoningError::Timeout(timeout_secs)))
    }

    /// Answers per prompt, so tests can vary the reply by drug or gene.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ReasoningError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            available_models: vec!["mock-model".to_string()],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.available_models = models;
        self
    }

    /// Number of `generate` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _model: &str, prompt: &str, _system: &str) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(prompt)
    }

    fn list_models(&self) -> Result<Vec<String>, ReasoningError> {
        Ok(self.available_models.clone())
    }
}
