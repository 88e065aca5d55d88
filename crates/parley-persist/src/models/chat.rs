use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Longest title kept when a chat is named after its first message
pub const MAX_TITLE_CHARS: usize = 100;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Database-agnostic chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(id: Uuid, user_id: impl Into<String>, title: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            title: title.into(),
            visibility,
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

/// Title for a chat created from `text`: the first [`MAX_TITLE_CHARS`]
/// characters, or [`DEFAULT_CHAT_TITLE`] when there is no text.
pub fn title_from_text(text: &str) -> String {
    let title: String = text.chars().take(MAX_TITLE_CHARS).collect();
    if title.trim().is_empty() {
        DEFAULT_CHAT_TITLE.to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_truncates_by_characters() {
        let text = "é".repeat(150);
        let title = title_from_text(&text);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_title_keeps_short_text() {
        assert_eq!(title_from_text("Hello there"), "Hello there");
    }

    #[test]
    fn test_title_defaults_when_empty() {
        assert_eq!(title_from_text(""), DEFAULT_CHAT_TITLE);
        assert_eq!(title_from_text("   "), DEFAULT_CHAT_TITLE);
    }

    #[test]
    fn test_visibility_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Visibility::Public).unwrap(), "\"public\"");
    }
}
