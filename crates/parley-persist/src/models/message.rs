use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Database-agnostic message model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(id: Uuid, chat_id: Uuid, parts: Vec<MessagePart>) -> Self {
        Self {
            id,
            chat_id,
            role: MessageRole::User,
            parts,
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(id: Uuid, chat_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id,
            chat_id,
            role: MessageRole::Assistant,
            parts: vec![MessagePart::text(text)],
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Text of the first text part, if any
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            MessagePart::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// An assistant message with no parts yet, waiting to be filled in
    pub fn is_placeholder(&self) -> bool {
        self.role == MessageRole::Assistant && self.parts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        media_type: String,
        name: String,
        url: String,
    },
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_wire_format() {
        let part = MessagePart::File {
            media_type: "image/png".to_string(),
            name: "cat.png".to_string(),
            url: "https://example.com/cat.png".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&part).unwrap(),
            json!({"type": "file", "mediaType": "image/png", "name": "cat.png", "url": "https://example.com/cat.png"})
        );
        assert_eq!(
            serde_json::to_value(MessagePart::text("hi")).unwrap(),
            json!({"type": "text", "text": "hi"})
        );
    }

    #[test]
    fn test_first_text_skips_files() {
        let message = Message::user(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![
                MessagePart::File {
                    media_type: "image/jpeg".to_string(),
                    name: "a.jpg".to_string(),
                    url: "https://example.com/a.jpg".to_string(),
                },
                MessagePart::text("describe this"),
            ],
        );
        assert_eq!(message.first_text(), Some("describe this"));
    }

    #[test]
    fn test_placeholder_detection() {
        let mut message = Message::assistant(Uuid::new_v4(), Uuid::new_v4(), "done");
        assert!(!message.is_placeholder());
        message.parts.clear();
        assert!(message.is_placeholder());

        let user = Message::user(Uuid::new_v4(), Uuid::new_v4(), Vec::new());
        assert!(!user.is_placeholder());
    }
}
