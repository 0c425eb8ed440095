//! The conversation session: bounded history plus serialised provider calls.
//!
//! [`Session`] is constructed once at startup and shared behind an `Arc`.
//! Two locks guard it:
//!
//! * `gate` (`tokio::sync::Mutex<()>`) is held for the whole of a
//!   submission, provider call included, so at most one call is in flight.
//!   Tokio's mutex is fair, which gives FIFO ordering under the `queue`
//!   policy; the `reject` policy uses `try_lock` instead.
//! * `inner` (`std::sync::Mutex`) protects history and state.  It is only
//!   held for short critical sections and never across `.await`, so display
//!   snapshots never wait for the network.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::{AppConfig, BusyPolicy, SessionConfig};
use crate::llm::{CompletionProvider, LlmError, Message};

use super::error::{AssistantReply, ErrorKind, SessionError};
use super::history::ConversationHistory;
use super::state::SessionState;

struct Inner {
    history: ConversationHistory,
    state: SessionState,
}

/// One conversation with a completion provider.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_assistant::config::AppConfig;
/// use voice_assistant::llm::ApiProvider;
/// use voice_assistant::session::Session;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let provider = Arc::new(ApiProvider::from_config(&config.llm));
/// let session = Session::from_config(provider, &config);
///
/// let reply = session.submit("what's the weather").await.unwrap();
/// println!("{}", reply.text);
/// # }
/// ```
pub struct Session {
    provider: Arc<dyn CompletionProvider>,
    system: Message,
    fallback_reply: String,
    busy_policy: BusyPolicy,
    request_timeout: Duration,
    gate: tokio::sync::Mutex<()>,
    inner: Mutex<Inner>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        config: &SessionConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            system: Message::system(config.system_prompt.clone()),
            fallback_reply: config.fallback_reply.clone(),
            busy_policy: config.busy_policy,
            request_timeout,
            gate: tokio::sync::Mutex::new(()),
            inner: Mutex::new(Inner {
                history: ConversationHistory::new(config.history_limit),
                state: SessionState::Idle,
            }),
        }
    }

    /// Build a session from the `[session]` table plus the provider timeout
    /// from `[llm]`.
    pub fn from_config(provider: Arc<dyn CompletionProvider>, config: &AppConfig) -> Self {
        Self::new(provider, &config.session, config.llm.request_timeout())
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Send one finalised utterance and return the reply to display.
    ///
    /// Provider failures do not surface as `Err`: they produce the configured
    /// fallback text tagged with [`ErrorKind::ProviderFailure`].  The user
    /// turn stays in history either way.
    pub async fn submit(&self, user_text: &str) -> Result<AssistantReply, SessionError> {
        match self.exchange(user_text).await {
            Ok(text) => Ok(AssistantReply::ok(text)),
            Err(SessionError::ProviderFailure(cause)) => {
                log::warn!("session: completion failed ({cause}); replying with fallback");
                Ok(AssistantReply::fallback(
                    self.fallback_reply.clone(),
                    ErrorKind::ProviderFailure,
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Clear the conversation history.  The system prompt is unaffected.
    ///
    /// Waits for an in-flight call under the `queue` policy; returns
    /// [`SessionError::Busy`] under `reject`.
    pub async fn reset(&self) -> Result<(), SessionError> {
        let _permit = self.acquire().await?;
        let mut inner = self.lock_inner();
        let dropped = inner.history.len();
        inner.history.clear();
        log::info!("session: history cleared ({dropped} messages)");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Copy of the stored turns, oldest first.  Never waits for a call.
    pub fn history(&self) -> Vec<Message> {
        self.lock_inner().history.snapshot()
    }

    pub fn state(&self) -> SessionState {
        self.lock_inner().state
    }

    pub fn system_prompt(&self) -> &str {
        self.system.content()
    }

    pub fn history_limit(&self) -> usize {
        self.lock_inner().history.limit()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// The strict form of [`submit`](Self::submit): provider failures come
    /// back as `Err(ProviderFailure)`.
    async fn exchange(&self, user_text: &str) -> Result<String, SessionError> {
        let text = user_text.trim();
        if text.is_empty() {
            log::debug!("session: ignoring empty utterance");
            return Err(SessionError::InvalidInput);
        }

        let _permit = self.acquire().await?;
        let _calling = CallingGuard::enter(self);

        let request = {
            let mut inner = self.lock_inner();
            inner.history.push(Message::user(text));
            inner.history.with_system(&self.system)
        };

        log::debug!("session: requesting completion ({} messages)", request.len());

        let reply = self
            .call_provider(&request)
            .await
            .map_err(SessionError::ProviderFailure)?;

        let evicted = self
            .lock_inner()
            .history
            .push(Message::assistant(reply.clone()));
        if evicted > 0 {
            log::debug!("session: evicted {evicted} oldest messages");
        }

        Ok(reply)
    }

    async fn call_provider(&self, request: &[Message]) -> Result<String, LlmError> {
        let reply = tokio::time::timeout(self.request_timeout, self.provider.complete(request))
            .await
            .map_err(|_| LlmError::Timeout)??;

        let content = reply.into_content();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }

    async fn acquire(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, SessionError> {
        match self.busy_policy {
            BusyPolicy::Queue => Ok(self.gate.lock().await),
            BusyPolicy::Reject => self.gate.try_lock().map_err(|_| {
                log::debug!("session: rejecting request, call in flight");
                SessionError::Busy
            }),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the session `Calling` for its lifetime.  Dropping it (normal
/// return, error, or the caller abandoning the future) restores `Idle`.
struct CallingGuard<'a> {
    session: &'a Session,
}

impl<'a> CallingGuard<'a> {
    fn enter(session: &'a Session) -> Self {
        session.lock_inner().state = SessionState::Calling;
        Self { session }
    }
}

impl Drop for CallingGuard<'_> {
    fn drop(&mut self) {
        self.session.lock_inner().state = SessionState::Idle;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
