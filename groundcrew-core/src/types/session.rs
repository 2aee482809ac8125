//! ABOUTME: Session identity and the deterministic fingerprint derivation

use super::message::{first_two_non_system, Message};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier for a session, derived from the first two non-system
/// messages of its opening turn. Two calls on the same opening messages
/// MUST produce the same id (`spec.md` §8 property 1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Derive a session id from a conversation's opening messages.
    ///
    /// Only the first two non-system messages participate; anything after
    /// that (including later turns, or system messages injected later) must
    /// not change the result.
    #[must_use]
    pub fn derive(messages: &[Message]) -> Self {
        let mut hasher = Sha256::new();
        for message in first_two_non_system(messages) {
            hasher.update(message.role_tag());
            hasher.update([0u8]);
            hasher.update(message.content.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();
        Self(hex_encode(&digest[..16]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Message {
    fn role_tag(&self) -> &'static [u8] {
        match self.role {
            super::message::Role::User => b"user",
            super::message::Role::Assistant => b"assistant",
            super::message::Role::System => b"system",
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let messages = vec![Message::user("hello"), Message::assistant("hi")];
        assert_eq!(SessionId::derive(&messages), SessionId::derive(&messages));
    }

    #[test]
    fn derivation_is_independent_of_later_messages() {
        let opening = vec![Message::user("hello"), Message::assistant("hi")];
        let mut extended = opening.clone();
        extended.push(Message::user("a third, unrelated message"));
        extended.push(Message::assistant("another reply"));
        assert_eq!(SessionId::derive(&opening), SessionId::derive(&extended));
    }

    #[test]
    fn derivation_differs_for_different_openings() {
        let a = vec![Message::user("hello")];
        let b = vec![Message::user("goodbye")];
        assert_ne!(SessionId::derive(&a), SessionId::derive(&b));
    }
}
