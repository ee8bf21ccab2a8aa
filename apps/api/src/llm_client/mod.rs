/// LLM Client — the single point of entry for every model call in the service.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// Handlers depend on the `CompletionClient` trait, never on `GeminiClient`.
///
/// One request per prompt. There is no retry loop here: a failed completion
/// fails the analysis request it belongs to.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

/// Decoding temperature for every analysis call. Low enough to keep output
/// close to deterministic without forcing greedy decoding.
pub const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A black-box text completion service.
///
/// Carried in `AppState` as `Arc<dyn CompletionClient>` so tests can swap in a fake.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the raw completion text for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            config.google_api_key.clone(),
            config.gemini_api_base.clone(),
            config.gemini_model.clone(),
            config.llm_timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        let text = generated.text().ok_or(LlmError::EmptyContent)?;

        debug!(
            "LLM call succeeded: model={}, finish_reason={:?}, chars={}",
            self.model,
            generated
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref()),
            text.len()
        );

        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/gemini-1.5-flash:generateContent";

    fn client_for(server: &MockServer, timeout: Duration) -> GeminiClient {
        GeminiClient::new(
            "secret".to_string(),
            server.uri(),
            "gemini-1.5-flash".to_string(),
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
                "generationConfig": {"temperature": 0.2}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server, Duration::from_secs(5))
            .complete("hello")
            .await
            .unwrap();
        assert_eq!(text, "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_provider_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"code": 429, "message": "Resource has been exhausted"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("hello")
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_provider_error_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 503, ref message } if message == "upstream down"));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_malformed_body_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_secs(5))
            .complete("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server, Duration::from_millis(50))
            .complete("hello")
            .await
            .unwrap_err();
        match err {
            LlmError::Http(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_text_skips_parts_without_text() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {}}, {"text": "ok"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("ok"));
    }

    #[test]
    fn test_text_none_when_blocked_without_content() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert!(response.text().is_none());
    }
}
