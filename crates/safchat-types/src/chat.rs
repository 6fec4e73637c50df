use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of one chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    /// Map a provider role string; unknown roles yield `None`
    pub fn from_provider(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One rendered turn: plain text plus HTML carrying citation markers.
///
/// Never persisted. Rebuilt from the provider's thread history on each load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub html: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            html: html.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }
}

/// Plain-text history entry (no HTML rendering)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_provider() {
        assert_eq!(ChatRole::from_provider("user"), Some(ChatRole::User));
        assert_eq!(ChatRole::from_provider("assistant"), Some(ChatRole::Assistant));
        assert_eq!(ChatRole::from_provider("tool"), None);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_empty_message() {
        let msg = ChatMessage::new(ChatRole::Assistant, "", "");
        assert!(msg.is_empty());
    }
}
