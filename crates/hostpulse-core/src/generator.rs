//! Text-generation collaborator.
//!
//! The composer treats the generator as unreliable: any failure maps to one of
//! the three [`GenerateError`] kinds and the caller falls back to local text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigError;

/// Why a generation attempt produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    /// Connection, HTTP status or body decoding failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// The call did not finish within its deadline.
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    /// The service answered but no candidate text could be extracted.
    #[error("empty response")]
    EmptyResponse,
}

impl GenerateError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Produces free text for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. Successful results are non-empty.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Default Gemini `generateContent` endpoint.
pub const DEFAULT_GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` REST call.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ConfigError::Invalid(format!("generator endpoint '{endpoint}': {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let payload = build_request(prompt);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerateError::from_reqwest(e, self.timeout))?;
        if !resp.status().is_success() {
            return Err(GenerateError::Transport(format!(
                "generateContent returned status {}",
                resp.status()
            )));
        }
        let value: Value = resp
            .json()
            .await
            .map_err(|e| GenerateError::from_reqwest(e, self.timeout))?;

        let text = extract_candidate_text(&value);
        if text.is_empty() {
            Err(GenerateError::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

fn build_request(prompt: &str) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
    }
}

/// Text of the first candidate: its non-empty parts, trimmed and joined with a
/// space. Any missing or mistyped field yields an empty string.
pub fn extract_candidate_text(value: &Value) -> String {
    let parts = value
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array);

    let Some(parts) = parts else {
        return String::new();
    };

    parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
