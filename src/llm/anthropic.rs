//! `AnthropicProvider`: [`CompletionProvider`] over the Anthropic Messages
//! API (`POST /v1/messages`).
//!
//! The Messages API takes the system prompt as a top-level `system` field
//! rather than as a turn, and only accepts `user` / `assistant` turns that
//! open with a user turn.  [`AnthropicProvider::request_body`] does that
//! reshaping; everything else mirrors [`ApiProvider`](super::ApiProvider).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::llm::message::{Message, Role};
use crate::llm::provider::{http_client, CompletionProvider, LlmError};

/// Value of the `anthropic-version` header sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Calls the Anthropic `/v1/messages` endpoint.
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl AnthropicProvider {
    /// Build from application config.  The API key is resolved once here
    /// (file first, then `ANTHROPIC_API_KEY`).
    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config, config.resolved_api_key())
    }

    /// Build with an explicit key; `None` sends no `x-api-key` header.
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Self {
        Self {
            client: http_client(config),
            config: config.clone(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url())
    }

    /// Messages API body for `messages`.
    ///
    /// System turns are lifted into `system`.  Leading assistant turns are
    /// dropped (the API requires the first turn to be the user's) and
    /// consecutive turns from the same role are joined with a newline.
    fn request_body(&self, messages: &[Message]) -> Value {
        let system = messages
            .iter()
            .filter(|m| m.role() == Role::System)
            .map(Message::content)
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut turns: Vec<(Role, String)> = Vec::new();
        for message in messages.iter().filter(|m| m.role() != Role::System) {
            if turns.is_empty() && message.role() != Role::User {
                continue;
            }
            match turns.last_mut() {
                Some((role, text)) if *role == message.role() => {
                    text.push('\n');
                    text.push_str(message.content());
                }
                _ => turns.push((message.role(), message.content().to_string())),
            }
        }

        let turns: Vec<Value> = turns
            .into_iter()
            .map(|(role, content)| json!({ "role": role.as_str(), "content": content }))
            .collect();

        let mut body = json!({
            "model":       self.model(),
            "messages":    turns,
            "max_tokens":  self.config.max_tokens,
            "temperature": self.config.temperature
        });
        if !system.is_empty() {
            body["system"] = Value::String(system);
        }
        body
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, messages: &[Message]) -> Result<Message, LlmError> {
        let body = self.request_body(messages);

        let mut req = self
            .client
            .post(self.endpoint())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        if let Some(key) = self.api_key.as_deref() {
            req = req.header("x-api-key", key);
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

        let json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let blocks = json["content"]
            .as_array()
            .ok_or_else(|| LlmError::Parse("response has no content blocks".into()))?;

        let text = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect::<String>();
        let text = text.trim();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(Message::assistant(text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
