use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_status, map_transport_error, LlmClient, ReasoningError};
use crate::config::ConfigError;

pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Upper bound on model-list pages followed in one `list_models` call.
const MAX_MODEL_PAGES: usize = 50;

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    response_schema: Option<Value>,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ConfigError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
            response_schema: None,
        })
    }

    /// Constrain every response to `schema` (OpenAPI subset).
    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a str, system: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: self.response_schema.as_ref(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct GeminiModel {
    name: String,
}

/// Concatenated text of the first candidate, if any.
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Follow `nextPageToken` until it is absent or empty.
fn collect_model_pages<F>(mut fetch: F) -> Result<Vec<String>, ReasoningError>
where
    F: FnMut(Option<&str>) -> Result<ListModelsResponse, ReasoningError>,
{
    let mut names = Vec::new();
    let mut token: Option<String> = None;
    for _ in 0..MAX_MODEL_PAGES {
        let page = fetch(token.as_deref())?;
        names.extend(
            page.models
                .into_iter()
                .map(|m| m.name.trim_start_matches("models/").to_string()),
        );
        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) => token = Some(next),
            None => return Ok(names),
        }
    }
    tracing::warn!(pages = MAX_MODEL_PAGES, "Model list truncated");
    Ok(names)
}

impl LlmClient for GeminiClient {
    fn generate(&self, model: &str, prompt: &str, system: &str) -> Result<String, ReasoningError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = self.request_body(prompt, system);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;
        let response = check_status(response)?;

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| ReasoningError::ResponseParsing(e.to_string()))?;

        first_candidate_text(parsed).ok_or(ReasoningError::EmptyResponse)
    }

    fn list_models(&self) -> Result<Vec<String>, ReasoningError> {
        let url = format!("{}/v1beta/models", self.base_url);

        collect_model_pages(|page_token| {
            let mut request = self
                .client
                .get(&url)
                .header("x-goog-api-key", &self.api_key);
            if let Some(token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let response = request
                .send()
                .map_err(|e| map_transport_error(e, &self.base_url, self.timeout_secs))?;
            let response = check_status(response)?;

            response
                .json::<ListModelsResponse>()
                .map_err(|e| ReasoningError::ResponseParsing(e.to_string()))
        })
    }
}
