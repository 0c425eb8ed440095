//! Conversation session module.
//!
//! * [`Session`]: owns the history, serialises provider calls, converts
//!   provider failures into a fallback reply.
//! * [`ConversationHistory`]: bounded, oldest-first window of turns.
//! * [`SessionState`]: `Idle` / `Calling`.
//! * [`SessionError`] / [`ErrorKind`] / [`AssistantReply`]: the result
//!   contract of `submit`.

pub mod error;
pub mod history;
pub mod manager;
pub mod state;

pub use error::{AssistantReply, ErrorKind, SessionError};
pub use history::ConversationHistory;
pub use manager::Session;
pub use state::SessionState;
