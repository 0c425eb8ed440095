//! Bounded conversation history.
//!
//! [`ConversationHistory`] keeps the most recent user/assistant turns in
//! insertion order.  Once the window holds `limit` messages, every push
//! evicts from the front.  The system prompt never lives here; the session
//! prepends it when building a request.

use std::collections::VecDeque;

use crate::llm::Message;

/// Rolling window of conversation turns, oldest first.
///
/// ```rust
/// use voice_assistant::llm::Message;
/// use voice_assistant::session::ConversationHistory;
///
/// let mut history = ConversationHistory::new(2);
/// history.push(Message::user("one"));
/// history.push(Message::assistant("two"));
/// history.push(Message::user("three"));
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.iter().next().unwrap().content(), "two");
/// ```
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    limit: usize,
}

impl ConversationHistory {
    /// Create an empty history capped at `limit` messages.
    ///
    /// A limit of 0 is raised to 1 so the turn being submitted is always
    /// part of the outbound request.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            messages: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Append `message`, evicting the oldest entries past the limit.
    ///
    /// Returns the number of evicted messages.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push_back(message);

        let mut evicted = 0;
        while self.messages.len() > self.limit {
            self.messages.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Owned copy of the current turns, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// `system` followed by every stored turn: the outbound request body.
    pub fn with_system(&self, system: &Message) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push(system.clone());
        out.extend(self.messages.iter().cloned());
        out
    }
}
