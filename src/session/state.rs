//! Session state machine.
//!
//! ```text
//! Idle ──submit──▶ Calling ──reply / failure / timeout──▶ Idle
//! ```
//!
//! `reset()` only runs from `Idle`.  There is no terminal state; a session
//! lives until the process exits.

/// Phase of a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No provider call in flight.
    #[default]
    Idle,

    /// A provider call is in flight; further submissions queue or are
    /// rejected depending on the busy policy.
    Calling,
}

impl SessionState {
    /// Returns `true` while a provider call is in flight.
    ///
    /// ```
    /// use voice_assistant::session::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_busy());
    /// assert!(SessionState::Calling.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Calling)
    }

    /// A short label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Calling => "Thinking",
        }
    }
}
