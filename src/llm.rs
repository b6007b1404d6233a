//! Model backend client
//!
//! Defines the client trait used by the digest pipeline and two
//! implementations:
//! - `OllamaClient`: POSTs to a local Ollama-style `/api/generate` endpoint (production)
//! - `MockSummarizer`: scripted responses (testing, offline runs)
//!
//! Clients never retry. Callers decide what a failure means.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Text produced by one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Wall time of the call. Telemetry only.
    pub elapsed: Duration,
}

/// Errors from backend calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

/// Client trait for text generation.
///
/// Abstracts over transport (HTTP, mock) so the pipeline doesn't depend on
/// how the model is reached.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Generate text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<Generation, BackendError>;

    /// Check if the backend is reachable.
    async fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for an Ollama-compatible generate endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    /// # Arguments
    /// * `endpoint` - Full generate URL (e.g., "http://localhost:11434/api/generate")
    /// * `model` - Model name (e.g., "llama3.1:8b")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Server root derived from the endpoint (`http://host:port/`).
    fn base_url(&self) -> String {
        match reqwest::Url::parse(&self.endpoint) {
            Ok(mut url) => {
                url.set_path("/");
                url.set_query(None);
                url.to_string()
            }
            Err(_) => self.endpoint.clone(),
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Unreachable {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// Pull generated text out of a response body.
fn parse_generate_body(body: &str) -> Result<String, BackendError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(BackendError::MalformedResponse(format!(
            "backend reported error: {}",
            error
        )));
    }

    match parsed.response {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(_) => Err(BackendError::MalformedResponse(
            "empty response text".to_string(),
        )),
        None => Err(BackendError::MalformedResponse(
            "missing `response` field".to_string(),
        )),
    }
}

#[async_trait]
impl Summarizer for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
        let start = Instant::now();
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = parse_generate_body(&body)?;
        let elapsed = start.elapsed();
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "generation finished"
        );
        Ok(Generation { text, elapsed })
    }

    async fn is_available(&self) -> bool {
        match self.client.get(self.base_url()).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

/// Mock client for testing: scripted responses, recorded prompts.
///
/// By default it answers every prompt with `summary #<n>` where `n` counts
/// calls from 1. Prompts containing any registered failure marker fail with
/// `BackendError::Status { status: 500, .. }`.
pub struct MockSummarizer {
    available: bool,
    fail_all: bool,
    fail_markers: Vec<String>,
    delays: Vec<(String, Duration)>,
    prompts: Mutex<Vec<String>>,
}

impl MockSummarizer {
    /// A mock that answers every prompt.
    pub fn new() -> Self {
        Self {
            available: true,
            fail_all: false,
            fail_markers: Vec::new(),
            delays: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose backend is down: every call is `Unreachable`.
    pub fn unreachable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// A mock that reaches the backend but every call fails.
    pub fn always_failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// Fail any prompt containing `marker`.
    pub fn failing_when(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Delay responses to prompts containing `marker`.
    pub fn delaying_when(mut self, marker: impl Into<String>, delay: Duration) -> Self {
        self.delays.push((marker.into(), delay));
        self
    }

    /// All prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for MockSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn generate(&self, prompt: &str) -> Result<Generation, BackendError> {
        let call_number = match self.prompts.lock() {
            Ok(mut prompts) => {
                prompts.push(prompt.to_string());
                prompts.len()
            }
            Err(_) => 0,
        };

        if let Some((_, delay)) = self.delays.iter().find(|(m, _)| prompt.contains(m.as_str())) {
            tokio::time::sleep(*delay).await;
        }

        if !self.available {
            return Err(BackendError::Unreachable {
                endpoint: "mock".to_string(),
                reason: "mock backend configured as unreachable".to_string(),
            });
        }
        if self.fail_all || self.fail_markers.iter().any(|m| prompt.contains(m.as_str())) {
            return Err(BackendError::Status {
                status: 500,
                body: format!("mock failure for call {}", call_number),
            });
        }

        Ok(Generation {
            text: format!("summary #{}", call_number),
            elapsed: Duration::from_millis(1),
        })
    }

    async fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_body_extracts_trimmed_text() {
        let text = parse_generate_body(r#"{"model":"m","response":"  hello \n","done":true}"#).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn parse_body_rejects_missing_or_empty_text() {
        assert!(matches!(
            parse_generate_body(r#"{"done":true}"#),
            Err(BackendError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_generate_body(r#"{"response":"   "}"#),
            Err(BackendError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_generate_body("not json"),
            Err(BackendError::MalformedResponse(_))
        ));
    }

    #[test]
    fn parse_body_surfaces_backend_error_field() {
        let err = parse_generate_body(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn request_serializes_with_streaming_disabled() {
        let request = GenerateRequest {
            model: "llama3.1:8b",
            prompt: "hi",
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "llama3.1:8b", "prompt": "hi", "stream": false})
        );
    }

    #[test]
    fn base_url_strips_path() {
        let client = OllamaClient::new("http://localhost:11434/api/generate", "m");
        assert_eq!(client.base_url(), "http://localhost:11434/");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_backend_error() {
        // Port 9 (discard) on localhost is not an HTTP server
        let client = OllamaClient::new("http://127.0.0.1:9/api/generate", "m");
        assert!(client.generate("hello").await.is_err());
        assert!(!client.is_available().await);
    }

    #[tokio::test]
    async fn mock_numbers_responses_and_records_prompts() {
        let mock = MockSummarizer::new();
        assert_eq!(mock.generate("a").await.unwrap().text, "summary #1");
        assert_eq!(mock.generate("b").await.unwrap().text, "summary #2");
        assert_eq!(mock.prompts(), vec!["a", "b"]);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn mock_fails_on_marker() {
        let mock = MockSummarizer::new().failing_when("BOOM");
        assert!(mock.generate("fine").await.is_ok());
        let err = mock.generate("xx BOOM xx").await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn mock_unreachable() {
        let mock = MockSummarizer::unreachable();
        assert!(!mock.is_available().await);
        let err = mock.generate("x").await.unwrap_err();
        assert!(matches!(err, BackendError::Unreachable { .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn mock_always_failing() {
        let mock = MockSummarizer::always_failing();
        assert!(mock.is_available().await);
        assert!(mock.generate("x").await.is_err());
    }
}
