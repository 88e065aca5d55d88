use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Chat, Message, MessagePart, StreamRecord};
use crate::error::Result;

/// Trait for database persistence operations
///
/// Implementations provide database-specific CRUD operations. Writes to a
/// single record are expected to be serialized by the store itself; nothing
/// above this trait coordinates concurrent writers.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Get a chat by ID
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>>;

    /// Save a new chat
    async fn save_chat(&self, chat: Chat) -> Result<()>;

    /// Delete a chat together with its messages and stream records,
    /// returning the deleted chat
    async fn delete_chat(&self, chat_id: Uuid) -> Result<Option<Chat>>;

    /// List chats owned by a user, newest first
    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<Chat>>;

    /// Get all messages for a chat, oldest first
    async fn get_messages(&self, chat_id: Uuid) -> Result<Vec<Message>>;

    /// Save messages; fails with `ChatNotFound` when a message's chat does
    /// not exist
    async fn save_messages(&self, messages: Vec<Message>) -> Result<()>;

    /// Replace the parts of an existing message, keeping its id and timestamp
    async fn update_message_parts(&self, message_id: Uuid, parts: Vec<MessagePart>) -> Result<()>;

    /// Count `user`-role messages sent by a user since the given instant
    async fn count_user_messages_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64>;

    /// Register a stream for a chat
    async fn create_stream_record(&self, record: StreamRecord) -> Result<()>;

    /// Stream ids registered for a chat, oldest first
    async fn list_stream_ids(&self, chat_id: Uuid) -> Result<Vec<Uuid>>;
}
