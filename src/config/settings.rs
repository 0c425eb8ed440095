//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`.
//! Every struct is `#[serde(default)]`, so a `settings.toml` only needs the
//! keys the user wants to change.

use std::time::Duration;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LlmProvider
// ---------------------------------------------------------------------------

/// Which completion API the assistant talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI `/v1/chat/completions` or any server speaking that dialect.
    #[default]
    OpenAi,
    /// Anthropic `/v1/messages`.
    Anthropic,
}

impl LlmProvider {
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com",
            LlmProvider::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-opus-20240229",
        }
    }

    /// Environment variable consulted when `llm.api_key` is not set.
    pub fn api_key_env(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Highest temperature the API accepts.
    pub fn max_temperature(self) -> f32 {
        match self {
            LlmProvider::OpenAi => 2.0,
            LlmProvider::Anthropic => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the remote completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend selector: `"openai"` (default) or `"anthropic"`.
    pub provider: LlmProvider,
    /// Base URL of the API.  `None` uses the provider's public endpoint.
    ///
    /// - OpenAI: `https://api.openai.com`
    /// - Anthropic: `https://api.anthropic.com`
    /// - Ollama: `http://localhost:11434`
    pub base_url: Option<String>,
    /// API key.  `None` falls back to the provider's environment variable
    /// (`OPENAI_API_KEY` or `ANTHROPIC_API_KEY`); local providers need
    /// neither.
    pub api_key: Option<String>,
    /// Model identifier sent with every request.  `None` uses the provider
    /// default.
    pub model: Option<String>,
    /// Sampling temperature: 0.0 to 2.0 for OpenAI, 0.0 to 1.0 for Anthropic.
    pub temperature: f32,
    /// Upper bound on the generated reply length.
    pub max_tokens: u32,
    /// Milliseconds to wait for a completion before giving up.
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            api_key: None,
            model: None,
            temperature: 0.7,
            max_tokens: 1024,
            request_timeout_ms: 30_000,
        }
    }
}

impl LlmConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Configured base URL without a trailing slash, or the provider default.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
    }

    /// Configured model, or the provider default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }

    /// Largest `max_tokens` the selected model accepts.  GPT-4 family models
    /// allow 8192, everything else 4096.
    pub fn max_tokens_ceiling(&self) -> u32 {
        match self.provider {
            LlmProvider::OpenAi if self.model().starts_with("gpt-4") => 8192,
            _ => 4096,
        }
    }

    /// The key from the file if non-empty, otherwise the provider's
    /// environment variable if non-empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| lookup(self.provider.api_key_env()).filter(|k| !k.is_empty()))
    }
}

// ---------------------------------------------------------------------------
// BusyPolicy
// ---------------------------------------------------------------------------

/// What a session does with a submission that arrives while a provider call
/// is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Wait behind the in-flight call, first come first served.
    #[default]
    Queue,
    /// Fail immediately with `SessionError::Busy`.
    Reject,
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for the conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum number of user/assistant turns kept as context.  The system
    /// prompt is not counted.
    pub history_limit: usize,
    /// Persona / instructions sent as the leading `system` message.
    pub system_prompt: String,
    /// Text shown to the user when the provider call fails.
    pub fallback_reply: String,
    /// Behaviour for overlapping submissions.
    pub busy_policy: BusyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            system_prompt: "You are a helpful voice assistant.".into(),
            fallback_reply: "Sorry, unable to process request.".into(),
            busy_policy: BusyPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use voice_assistant::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Completion provider settings.
    pub llm: LlmConfig,
    /// Conversation session settings.
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.session.history_limit >= 1,
            "session.history_limit must be at least 1"
        );
        ensure!(
            !self.session.system_prompt.trim().is_empty(),
            "session.system_prompt must not be empty"
        );
        ensure!(
            self.llm.request_timeout_ms > 0,
            "llm.request_timeout_ms must be greater than 0"
        );
        ensure!(
            self.llm.model.as_deref().map_or(true, |m| !m.trim().is_empty()),
            "llm.model must not be empty"
        );
        let max_temperature = self.llm.provider.max_temperature();
        ensure!(
            (0.0..=max_temperature).contains(&self.llm.temperature),
            "llm.temperature must be between 0.0 and {max_temperature} for {}",
            self.llm.provider.label()
        );
        let ceiling = self.llm.max_tokens_ceiling();
        ensure!(
            (1..=ceiling).contains(&self.llm.max_tokens),
            "llm.max_tokens must be between 1 and {ceiling} for model {}",
            self.llm.model()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
