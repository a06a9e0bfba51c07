//! Session records
//!
//! Chat sessions grow by appending messages; tool sessions are written once
//! when a tool call succeeds and never change afterwards.

use crate::tools::{ToolInputs, ToolKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single message in a chat session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(id: String, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSession {
    pub id: String,
    pub title: String,
    pub kind: ToolKind,
    pub inputs: ToolInputs,
    pub output: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Sidebar entry for either kind of session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolKind>,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_session_appends_in_order() {
        let mut session = ChatSession::new("chat_1".into(), "New Chat");
        session.push(ChatMessage::assistant("Hello!"));
        session.push(ChatMessage::user("What is an index fund?"));

        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[0].role, ChatRole::Assistant);
        assert_eq!(session.last_message().map(|m| m.role), Some(ChatRole::User));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(ChatRole::Assistant).unwrap(), "assistant");
        assert_eq!(serde_json::to_value(ChatRole::User).unwrap(), "user");
    }
}
