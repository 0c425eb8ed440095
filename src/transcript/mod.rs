//! Transcript source boundary.
//!
//! Speech recognition itself lives outside this crate.  A source pushes
//! [`TranscriptEvent`]s onto a `tokio::sync::mpsc` channel; the
//! [`TranscriptAdapter`] keeps only the final ones and hands their text to a
//! callback.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use voice_assistant::transcript::{TranscriptAdapter, TranscriptEvent};
//!
//! # async fn example() {
//! let (tx, rx) = mpsc::channel::<TranscriptEvent>(16);
//! let adapter = TranscriptAdapter::start(rx, |text| println!("final: {text}"));
//!
//! tx.send(TranscriptEvent::Final("hello".into())).await.unwrap();
//! adapter.stop();
//! # }
//! ```

pub mod adapter;
pub mod lines;

pub use adapter::TranscriptAdapter;
pub use lines::{parse_line, read_lines, HostCommand, LineInput};

/// A text fragment from the speech recogniser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Provisional text that may still change.  Never submitted.
    Interim(String),
    /// Settled text for a complete utterance.
    Final(String),
}

impl TranscriptEvent {
    pub fn is_final(&self) -> bool {
        matches!(self, TranscriptEvent::Final(_))
    }

    pub fn text(&self) -> &str {
        match self {
            TranscriptEvent::Interim(text) | TranscriptEvent::Final(text) => text,
        }
    }
}
