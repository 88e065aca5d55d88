use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::PersistError;
use crate::models::{Chat, Message, MessagePart, MessageRole, StreamRecord, Visibility};

/// MongoDB-specific Chat model (ids stored as hyphenated strings)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChat {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub visibility: Visibility,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// MongoDB-specific Message model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// MongoDB-specific Stream model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStream {
    #[serde(rename = "_id")]
    pub id: String,
    pub chat_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, PersistError> {
    Uuid::parse_str(raw).map_err(|e| PersistError::InvalidId(format!("{}: {}", raw, e)))
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<Chat> for MongoChat {
    fn from(chat: Chat) -> Self {
        Self {
            id: chat.id.to_string(),
            user_id: chat.user_id,
            title: chat.title,
            visibility: chat.visibility,
            created_at: chat.created_at,
        }
    }
}

impl TryFrom<MongoChat> for Chat {
    type Error = PersistError;

    fn try_from(chat: MongoChat) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&chat.id)?,
            user_id: chat.user_id,
            title: chat.title,
            visibility: chat.visibility,
            created_at: chat.created_at,
        })
    }
}

impl From<Message> for MongoMessage {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id.to_string(),
            chat_id: msg.chat_id.to_string(),
            role: msg.role,
            parts: msg.parts,
            attachments: msg.attachments,
            created_at: msg.created_at,
        }
    }
}

impl TryFrom<MongoMessage> for Message {
    type Error = PersistError;

    fn try_from(msg: MongoMessage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&msg.id)?,
            chat_id: parse_id(&msg.chat_id)?,
            role: msg.role,
            parts: msg.parts,
            attachments: msg.attachments,
            created_at: msg.created_at,
        })
    }
}

impl From<StreamRecord> for MongoStream {
    fn from(record: StreamRecord) -> Self {
        Self {
            id: record.id.to_string(),
            chat_id: record.chat_id.to_string(),
            created_at: record.created_at,
        }
    }
}
