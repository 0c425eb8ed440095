//! Completion-provider module.
//!
//! This module provides:
//! * [`Message`] / [`Role`]: role-tagged turns in the chat-completions shape.
//! * [`CompletionProvider`]: async trait implemented by all backends.
//! * [`ApiProvider`]: OpenAI-compatible REST API backend.
//! * [`AnthropicProvider`]: Anthropic Messages API backend.
//! * [`build_provider`]: picks the backend named by `llm.provider`.
//! * [`LlmError`]: error variants for provider calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_assistant::config::AppConfig;
//! use voice_assistant::llm::{build_provider, CompletionProvider, Message};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let provider = build_provider(&config.llm);
//!
//!     let reply = provider
//!         .complete(&[
//!             Message::system(config.session.system_prompt.clone()),
//!             Message::user("what's the weather"),
//!         ])
//!         .await
//!         .unwrap();
//!
//!     println!("{}", reply.content());
//! }
//! ```

pub mod anthropic;
pub mod message;
pub mod provider;

use std::sync::Arc;

use crate::config::{LlmConfig, LlmProvider};

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use anthropic::AnthropicProvider;
pub use message::{Message, Role};
pub use provider::{ApiProvider, CompletionProvider, LlmError};

/// Build the backend selected by `config.provider`.
pub fn build_provider(config: &LlmConfig) -> Arc<dyn CompletionProvider> {
    match config.provider {
        LlmProvider::OpenAi => Arc::new(ApiProvider::from_config(config)),
        LlmProvider::Anthropic => Arc::new(AnthropicProvider::from_config(config)),
    }
}
