//! Per-session chat history

use crate::llm::{Message, MessageRole};
use serde::{Deserialize, Serialize};

/// One stored chat message
pub type ConversationTurn = Message;

/// Append-only history of `(user, assistant)` exchanges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed exchange
    pub fn commit_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(Message::user(user));
        self.turns.push(Message::assistant(assistant));
    }

    /// The last `n` turns, oldest first
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Roles in order, mostly useful for checking the pairing invariant
    pub fn roles(&self) -> Vec<MessageRole> {
        self.turns.iter().map(|t| t.role).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchanges_alternate_roles() {
        let mut conversation = Conversation::new();
        conversation.commit_exchange("q1", "a1");
        conversation.commit_exchange("q2", "a2");

        assert_eq!(
            conversation.roles(),
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
        assert_eq!(conversation.turns()[2].content, "q2");
    }

    #[test]
    fn test_recent_window() {
        let mut conversation = Conversation::new();
        for i in 0..8 {
            conversation.commit_exchange(format!("q{i}"), format!("a{i}"));
        }

        let recent = conversation.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "q3");
        assert_eq!(recent[9].content, "a7");
        assert_eq!(conversation.recent(100).len(), 16);
    }

    #[test]
    fn test_clear() {
        let mut conversation = Conversation::new();
        conversation.commit_exchange("q", "a");
        conversation.clear();
        assert!(conversation.is_empty());
    }
}
