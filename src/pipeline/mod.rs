//! Runner module: wires transcripts to the session and replies to the UI.
//!
//! # Architecture
//!
//! ```text
//! TranscriptAdapter ──on_final──▶ AssistantCommand::Submit (unbounded mpsc)
//!                                        │
//!                                        ▼
//!                            AssistantRunner::run()  ← tokio task
//!                                        │
//!                                        ├─ Session::submit  → Thinking, Reply
//!                                        └─ Session::reset   → Cleared
//!
//! AssistantEvent (mpsc) ──▶ UI / terminal printer
//! ```
//!
//! The command channel is unbounded so the transcript callback, which is
//! synchronous, never has to wait or drop an utterance.

pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{AssistantCommand, AssistantEvent, AssistantRunner};
