//! ABOUTME: Conversation message type and role enum

use serde::{Deserialize, Serialize};

/// A single turn in a conversation. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Returns the first two non-system messages, in order.
///
/// Used by `sessionId(messages)` derivation (`spec.md` §4.1 step 2, §8
/// property 1): the fingerprint must be independent of every message after
/// the conversation's true start, including later system messages injected
/// mid-turn.
#[must_use]
pub fn first_two_non_system(messages: &[Message]) -> Vec<&Message> {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .take(2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_two_non_system_skips_system_messages() {
        let messages = vec![
            Message::system("you are a helpful assistant"),
            Message::user("hello"),
            Message::system("injected mid-turn"),
            Message::assistant("hi there"),
            Message::user("third"),
        ];
        let first_two = first_two_non_system(&messages);
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0].content, "hello");
        assert_eq!(first_two[1].content, "hi there");
    }

    #[test]
    fn first_two_non_system_handles_short_histories() {
        let messages = vec![Message::user("only one")];
        assert_eq!(first_two_non_system(&messages).len(), 1);
        assert!(first_two_non_system(&[]).is_empty());
    }
}
