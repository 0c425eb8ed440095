//! Assistant runner: drives a [`Session`] from a command channel.
//!
//! ```text
//! AssistantCommand::Submit(text)
//!   └─▶ AssistantEvent::Thinking
//!       └─▶ session.submit(text)
//!             ├─ Ok(reply)          → AssistantEvent::Reply(reply)
//!             ├─ Err(InvalidInput)  → ignored
//!             └─ Err(Busy)          → logged
//!
//! AssistantCommand::Reset
//!   └─▶ session.reset() → AssistantEvent::Cleared
//! ```
//!
//! Commands are handled one at a time in arrival order, so the runner is the
//! single logical worker for its session.  When the command channel closes
//! the runner finishes the command it is on and returns.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::session::{AssistantReply, Session, SessionError};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Requests sent to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantCommand {
    /// A final transcript to answer.
    Submit(String),
    /// Start a fresh topic.
    Reset,
}

impl AssistantCommand {
    /// Queue this command for the runner behind `commands`.
    ///
    /// Returns `false` and logs a warning when the runner has already exited,
    /// so callers never drop a command silently.
    pub fn dispatch(self, commands: &mpsc::UnboundedSender<AssistantCommand>) -> bool {
        let name = match &self {
            AssistantCommand::Submit(_) => "transcript",
            AssistantCommand::Reset => "reset",
        };
        match commands.send(self) {
            Ok(()) => true,
            Err(_) => {
                log::warn!("runner is gone; dropping {name}");
                false
            }
        }
    }
}

/// Progress and replies delivered to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantEvent {
    /// A provider call for a submitted utterance is starting.
    Thinking,
    /// The reply to show.  Carries an error kind when it is the fallback.
    Reply(AssistantReply),
    /// History was cleared.
    Cleared,
}

// ---------------------------------------------------------------------------
// AssistantRunner
// ---------------------------------------------------------------------------

/// Bridges the command channel to a shared [`Session`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use voice_assistant::config::AppConfig;
/// use voice_assistant::llm::ApiProvider;
/// use voice_assistant::pipeline::{AssistantCommand, AssistantRunner};
/// use voice_assistant::session::Session;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let provider = Arc::new(ApiProvider::from_config(&config.llm));
/// let session = Arc::new(Session::from_config(provider, &config));
///
/// let (command_tx, command_rx) = mpsc::unbounded_channel();
/// let (event_tx, mut event_rx) = mpsc::channel(32);
/// tokio::spawn(AssistantRunner::new(session, event_tx).run(command_rx));
///
/// command_tx.send(AssistantCommand::Submit("hello".into())).unwrap();
/// while let Some(event) = event_rx.recv().await {
///     println!("{event:?}");
/// }
/// # }
/// ```
pub struct AssistantRunner {
    session: Arc<Session>,
    events: mpsc::Sender<AssistantEvent>,
}

impl AssistantRunner {
    pub fn new(session: Arc<Session>, events: mpsc::Sender<AssistantEvent>) -> Self {
        Self { session, events }
    }

    /// Run until `commands` is closed.
    pub async fn run(self, mut commands: mpsc::UnboundedReceiver<AssistantCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                AssistantCommand::Submit(text) => self.handle_submit(&text).await,
                AssistantCommand::Reset => self.handle_reset().await,
            }
        }

        log::info!("runner: command channel closed, shutting down");
    }

    async fn handle_submit(&self, text: &str) {
        // Empty utterances are dropped before the UI hears about them.
        if text.trim().is_empty() {
            log::debug!("runner: ignoring empty transcript");
            return;
        }

        self.emit(AssistantEvent::Thinking).await;

        match self.session.submit(text).await {
            Ok(reply) => {
                if reply.is_fallback() {
                    log::debug!("runner: delivering fallback reply");
                }
                self.emit(AssistantEvent::Reply(reply)).await;
            }
            Err(SessionError::InvalidInput) => {
                log::debug!("runner: session rejected empty transcript");
            }
            Err(e) => {
                log::warn!("runner: submit rejected: {e}");
            }
        }
    }

    async fn handle_reset(&self) {
        match self.session.reset().await {
            Ok(()) => self.emit(AssistantEvent::Cleared).await,
            Err(e) => log::warn!("runner: reset rejected: {e}"),
        }
    }

    async fn emit(&self, event: AssistantEvent) {
        // The UI going away is not an error for the session.
        if self.events.send(event).await.is_err() {
            log::debug!("runner: event receiver dropped");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
