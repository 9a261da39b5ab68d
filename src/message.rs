//! Application-level chat message.
//!
//! A [`Message`] is immutable once constructed and travels verbatim over
//! the wire: the sender's timestamp is preserved at the receiver, never
//! re-stamped, so an encode/decode round trip is exact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat message exchanged between peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identity string of the sender.
    pub sender: String,
    /// Text body.
    pub content: String,
    /// Stamped by the sender at construction time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.sender,
            self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_is_exact() {
        let msg = Message::new("alice", "hello world");
        let json = serde_json::to_vec(&msg).unwrap();
        let back: Message = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = br#"{"sender": "alice", "content": "no timestamp"}"#;
        assert!(serde_json::from_slice::<Message>(json).is_err());
    }

    #[test]
    fn test_display_includes_sender_and_content() {
        let msg = Message::new("bob", "hi");
        let rendered = msg.to_string();
        assert!(rendered.contains("bob"));
        assert!(rendered.contains("hi"));
    }
}
