use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{Chat, Message, MessagePart, MessageRole, StreamRecord};
use crate::trait_client::PersistenceClient;

/// Process-local store backed by hash maps
///
/// Used by the test suites and for running the server without a database.
#[derive(Default)]
pub struct InMemoryPersistence {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    chats: HashMap<Uuid, Chat>,
    messages: Vec<Message>,
    streams: Vec<StreamRecord>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistence {
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        Ok(self.inner.read().await.chats.get(&chat_id).cloned())
    }

    async fn save_chat(&self, chat: Chat) -> Result<()> {
        self.inner.write().await.chats.insert(chat.id, chat);
        Ok(())
    }

    async fn delete_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        let mut tables = self.inner.write().await;
        let removed = tables.chats.remove(&chat_id);
        if removed.is_some() {
            tables.messages.retain(|m| m.chat_id != chat_id);
            tables.streams.retain(|s| s.chat_id != chat_id);
        }
        Ok(removed)
    }

    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<Chat>> {
        let tables = self.inner.read().await;
        let mut chats: Vec<Chat> = tables
            .chats
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        chats.truncate(limit);
        Ok(chats)
    }

    async fn get_messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.inner.read().await;
        // Stable sort keeps insertion order for equal timestamps
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn save_messages(&self, messages: Vec<Message>) -> Result<()> {
        let mut tables = self.inner.write().await;
        if let Some(orphan) = messages.iter().find(|m| !tables.chats.contains_key(&m.chat_id)) {
            return Err(PersistError::ChatNotFound(orphan.chat_id.to_string()));
        }
        tables.messages.extend(messages);
        Ok(())
    }

    async fn update_message_parts(&self, message_id: Uuid, parts: Vec<MessagePart>) -> Result<()> {
        let mut tables = self.inner.write().await;
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| PersistError::MessageNotFound(message_id.to_string()))?;
        message.parts = parts;
        Ok(())
    }

    async fn count_user_messages_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64> {
        let tables = self.inner.read().await;
        let count = tables
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::User && m.created_at >= since)
            .filter(|m| {
                tables
                    .chats
                    .get(&m.chat_id)
                    .is_some_and(|c| c.user_id == user_id)
            })
            .count();
        Ok(count as u64)
    }

    async fn create_stream_record(&self, record: StreamRecord) -> Result<()> {
        self.inner.write().await.streams.push(record);
        Ok(())
    }

    async fn list_stream_ids(&self, chat_id: Uuid) -> Result<Vec<Uuid>> {
        let tables = self.inner.read().await;
        let mut records: Vec<&StreamRecord> = tables
            .streams
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .collect();
        records.sort_by_key(|s| s.created_at);
        Ok(records.into_iter().map(|s| s.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visibility;
    use chrono::Duration;

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = InMemoryPersistence::new();
        let chat = Chat::new(Uuid::new_v4(), "alice", "hello", Visibility::Private);
        store.save_chat(chat.clone()).await.unwrap();
        store
            .save_messages(vec![Message::user(Uuid::new_v4(), chat.id, vec![MessagePart::text("hello")])])
            .await
            .unwrap();
        store.create_stream_record(StreamRecord::new(chat.id)).await.unwrap();

        let deleted = store.delete_chat(chat.id).await.unwrap();
        assert_eq!(deleted, Some(chat.clone()));
        assert!(store.get_messages(chat.id).await.unwrap().is_empty());
        assert!(store.list_stream_ids(chat.id).await.unwrap().is_empty());
        assert_eq!(store.delete_chat(chat.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_count_only_counts_own_user_messages() {
        let store = InMemoryPersistence::new();
        let mine = Chat::new(Uuid::new_v4(), "alice", "a", Visibility::Private);
        let theirs = Chat::new(Uuid::new_v4(), "bob", "b", Visibility::Private);
        store.save_chat(mine.clone()).await.unwrap();
        store.save_chat(theirs.clone()).await.unwrap();

        let mut old = Message::user(Uuid::new_v4(), mine.id, vec![MessagePart::text("old")]);
        old.created_at = Utc::now() - Duration::hours(48);
        store
            .save_messages(vec![
                old,
                Message::user(Uuid::new_v4(), mine.id, vec![MessagePart::text("new")]),
                Message::assistant(Uuid::new_v4(), mine.id, "reply"),
                Message::user(Uuid::new_v4(), theirs.id, vec![MessagePart::text("other")]),
            ])
            .await
            .unwrap();

        let since = Utc::now() - Duration::hours(24);
        assert_eq!(store.count_user_messages_since("alice", since).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_messages_need_an_existing_chat() {
        let store = InMemoryPersistence::new();
        let chat = Chat::new(Uuid::new_v4(), "alice", "gone", Visibility::Private);
        store.save_chat(chat.clone()).await.unwrap();
        store.delete_chat(chat.id).await.unwrap();

        let result = store
            .save_messages(vec![Message::assistant(Uuid::new_v4(), chat.id, "late")])
            .await;

        assert!(matches!(result, Err(PersistError::ChatNotFound(_))));
        assert!(store.get_messages(chat.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_message_fails() {
        let store = InMemoryPersistence::new();
        let result = store.update_message_parts(Uuid::new_v4(), Vec::new()).await;
        assert!(matches!(result, Err(PersistError::MessageNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_chats_newest_first() {
        let store = InMemoryPersistence::new();
        let mut first = Chat::new(Uuid::new_v4(), "alice", "first", Visibility::Private);
        first.created_at = Utc::now() - Duration::minutes(5);
        let second = Chat::new(Uuid::new_v4(), "alice", "second", Visibility::Public);
        store.save_chat(first.clone()).await.unwrap();
        store.save_chat(second.clone()).await.unwrap();

        let chats = store.list_chats("alice", 10).await.unwrap();
        assert_eq!(chats, vec![second, first.clone()]);
        assert_eq!(store.list_chats("alice", 1).await.unwrap().len(), 1);
    }
}
