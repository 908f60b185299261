//! Chat message models shared by the server and client.

use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// Single message in a conversation.
///
/// An ordered `Vec<ChatMessage>` is the conversation sent to the provider;
/// only the trailing assistant message is mutated while a stream is live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let message = ChatMessage::user("hi");
        let json = serde_json::to_value(&message).expect("message should serialize");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn message_round_trips() {
        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#)
                .expect("message should deserialize");
        assert_eq!(parsed, ChatMessage::assistant("hello"));
    }
}
