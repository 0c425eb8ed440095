//! Core `CompletionProvider` trait and `ApiProvider` implementation.
//!
//! `ApiProvider` calls any OpenAI-compatible `/v1/chat/completions` endpoint
//! (OpenAI, Ollama in OpenAI mode, Groq, LM Studio, vLLM, ...).  All
//! connection details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::llm::message::Message;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while requesting a completion.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("completion request timed out")]
    Timeout,

    /// The provider answered with a non-2xx status (rate limits included).
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// The provider returned a response with no usable text content.
    #[error("provider returned an empty completion")]
    EmptyResponse,
}

/// Longest provider error body kept in [`LlmError::Status`], in chars.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

impl LlmError {
    /// Build a [`LlmError::Status`], cutting `body` to
    /// [`MAX_ERROR_BODY_CHARS`] so an HTML error page does not flood the log.
    pub fn status(status: u16, body: &str) -> Self {
        let mut chars = body.chars();
        let mut kept: String = chars.by_ref().take(MAX_ERROR_BODY_CHARS).collect();
        if chars.next().is_some() {
            kept.push_str("...");
        }
        LlmError::Status { status, body: kept }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CompletionProvider trait
// ---------------------------------------------------------------------------

/// Async trait for chat-completion backends.
///
/// Implementors must be stateless with respect to any one conversation and
/// `Send + Sync`, so a single `Arc<dyn CompletionProvider>` can be shared by
/// any number of sessions.
///
/// `messages` is the full outbound list, system prompt first.  The returned
/// message is the single assistant choice.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<Message, LlmError>;
}

// ---------------------------------------------------------------------------
// ApiProvider
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiProvider {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl ApiProvider {
    /// Build an `ApiProvider` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.request_timeout_ms`.  The API key is resolved once here (file
    /// first, then `OPENAI_API_KEY`).
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config, config.resolved_api_key())
    }

    /// Build with an explicit key; `None` sends no `Authorization` header.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            client: http_client(config),
            config: config.clone(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        self.config.model()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url())
    }
}

/// reqwest client carrying the configured per-request timeout.
pub(crate) fn http_client(config: &LlmConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[async_trait]
impl CompletionProvider for ApiProvider {
    /// Request exactly one completion choice for `messages`.
    ///
    /// The `Authorization: Bearer …` header is attached only when a non-empty
    /// key was resolved, so local providers work without one.
    async fn complete(&self, messages: &[Message]) -> Result<Message, LlmError> {
        let body = serde_json::json!({
            "model":       self.model(),
            "messages":    messages,
            "n":           1,
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  self.config.max_tokens
        });

        let mut req = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            req = req.bearer_auth(key);
        }

        log::debug!(
            "provider: POST {} ({} messages, model={})",
            self.endpoint(),
            messages.len(),
            self.model()
        );

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::status(status.as_u16(), &body));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| LlmError::Parse("response has no choices".into()))?;

        let content = choice["message"]["content"]
            .as_str()
            .ok_or(LlmError::EmptyResponse)?
            .trim();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(Message::assistant(content))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn make_config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: Some(base_url.into()),
            api_key: api_key.map(|s| s.to_string()),
            model: Some("gpt-test".into()),
            max_tokens: 64,
            request_timeout_ms: 2_000,
            ..LlmConfig::default()
        }
    }

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("You are a helpful voice assistant."),
            Message::user("what's the weather"),
        ]
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn CompletionProvider> =
            Box::new(ApiProvider::from_config(&make_config("http://localhost:1", None)));
        drop(provider);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let provider = ApiProvider::from_config(&make_config("http://localhost:1/", None));
        assert_eq!(provider.endpoint(), "http://localhost:1/v1/chat/completions");
        assert_eq!(provider.model(), "gpt-test");
    }

    #[tokio::test]
    async fn sends_single_choice_request_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-test",
                "n": 1,
                "messages": [
                    { "role": "system", "content": "You are a helpful voice assistant." },
                    { "role": "user", "content": "what's the weather" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"index":0,"message":{"role":"assistant","content":" I don't have real-time data. "}}]}"#,
            )
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let reply = provider.complete(&conversation()).await.unwrap();

        assert_eq!(reply, Message::assistant("I don't have real-time data."));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let err = provider.complete(&conversation()).await.unwrap_err();

        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn long_error_body_is_truncated() {
        let mut server = mockito::Server::new_async().await;
        // Multi-byte chars so a byte-based cut would split one.
        let page = "é".repeat(4_000);
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(502)
            .with_body(&page)
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let err = provider.complete(&conversation()).await.unwrap_err();

        match err {
            LlmError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS + 3);
                assert!(body.ends_with("..."));
                assert!(body.starts_with("éé"));
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[test]
    fn short_error_body_is_kept_whole() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS);
        match LlmError::status(500, &body) {
            LlmError::Status { body: kept, .. } => assert_eq!(kept, body),
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn keyless_request_sends_no_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"local reply"}}]}"#)
            .create_async()
            .await;

        let provider = ApiProvider::new(&make_config(&server.url(), None), None);
        let reply = provider.complete(&conversation()).await.unwrap();

        assert_eq!(reply.content(), "local reply");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_key_is_treated_as_no_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
            .create_async()
            .await;

        let provider = ApiProvider::new(&make_config(&server.url(), None), Some(String::new()));
        provider.complete(&conversation()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let err = provider.complete(&conversation()).await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn missing_choices_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let err = provider.complete(&conversation()).await.unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn blank_content_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"   "}}]}"#)
            .create_async()
            .await;

        let provider = ApiProvider::from_config(&make_config(&server.url(), Some("sk-test")));
        let err = provider.complete(&conversation()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        // Port 9 (discard) on localhost is not expected to accept connections.
        let provider = ApiProvider::from_config(&make_config("http://127.0.0.1:9", None));
        let err = provider.complete(&conversation()).await.unwrap_err();
        assert!(
            matches!(err, LlmError::Request(_) | LlmError::Timeout),
            "got {err:?}"
        );
    }
}
