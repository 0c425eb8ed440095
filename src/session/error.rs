//! Session errors and the reply shape handed to the UI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmError;

/// Errors produced at the session boundary.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The utterance was empty or whitespace only.  Nothing was sent.
    #[error("utterance is empty")]
    InvalidInput,

    /// Another submission is in flight and the busy policy is `reject`.
    #[error("a request is already in flight")]
    Busy,

    /// The completion provider failed.  Converted into a fallback reply
    /// before it reaches the caller of `submit`.
    #[error("completion provider failed")]
    ProviderFailure(#[source] LlmError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::InvalidInput => ErrorKind::InvalidInput,
            SessionError::Busy => ErrorKind::Busy,
            SessionError::ProviderFailure(_) => ErrorKind::ProviderFailure,
        }
    }
}

/// Fieldless tag for [`SessionError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ProviderFailure,
    Busy,
}

/// The text to display for one submitted utterance.
///
/// Serialises as `{"text": "..."}` or, after a provider failure,
/// `{"text": "<fallback>", "error": "provider_failure"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl AssistantReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn fallback(text: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            text: text.into(),
            error: Some(kind),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(SessionError::InvalidInput.kind(), ErrorKind::InvalidInput);
        assert_eq!(SessionError::Busy.kind(), ErrorKind::Busy);
        assert_eq!(
            SessionError::ProviderFailure(LlmError::Timeout).kind(),
            ErrorKind::ProviderFailure
        );
    }

    #[test]
    fn provider_failure_keeps_cause() {
        let err = SessionError::ProviderFailure(LlmError::Status {
            status: 503,
            body: "overloaded".into(),
        });
        let source = err.source().expect("cause should be attached");
        assert!(source.to_string().contains("503"));
    }

    #[test]
    fn reply_serialisation_omits_missing_error() {
        let ok = serde_json::to_value(AssistantReply::ok("hi")).unwrap();
        assert_eq!(ok, serde_json::json!({ "text": "hi" }));

        let failed = serde_json::to_value(AssistantReply::fallback(
            "sorry",
            ErrorKind::ProviderFailure,
        ))
        .unwrap();
        assert_eq!(
            failed,
            serde_json::json!({ "text": "sorry", "error": "provider_failure" })
        );
    }
}
