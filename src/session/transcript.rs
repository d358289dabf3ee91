//! Ordered record of the prompts and replies shown to the user.

use serde::Serialize;

use crate::llm::Message;

/// Chronological transcript of one session.
///
/// Only complete exchanges are ever recorded, so the length is always even.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user prompt and the assistant reply, in that order.
    pub fn append_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.messages.reserve(2);
        self.messages.push(Message::user(prompt));
        self.messages.push(Message::assistant(reply));
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of complete exchanges.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.messages.len() / 2
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
