//! Voice assistant session core.
//!
//! Final speech transcripts flow into a [`session::Session`], which keeps a
//! bounded conversation history, serialises calls to an OpenAI-compatible
//! completion provider and hands back the assistant's reply.
//!
//! ```text
//! TranscriptAdapter ──final──▶ AssistantRunner ──submit──▶ Session ──▶ CompletionProvider
//!                                     │                       │
//!                                     ◀──── AssistantEvent ───┘
//! ```

pub mod config;
pub mod llm;
pub mod pipeline;
pub mod session;
pub mod transcript;
