//! Decides where an assistant reply is stored.
//!
//! A chat whose last message is an assistant message without parts holds a
//! placeholder; the reply fills it in place. Any other tail gets a new
//! assistant message appended. The read of the tail and the following write
//! are not atomic, so overlapping requests on one chat may both append or
//! both overwrite.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Message, MessagePart};
use crate::trait_client::PersistenceClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyAction {
    /// Overwrite the parts of this placeholder message
    Update { id: Uuid },
    /// Insert a new assistant message with this id
    Append { id: Uuid },
}

impl ReplyAction {
    pub fn id(&self) -> Uuid {
        match self {
            ReplyAction::Update { id } | ReplyAction::Append { id } => *id,
        }
    }
}

pub fn reconcile_reply(tail: Option<&Message>) -> ReplyAction {
    match tail {
        Some(message) if message.is_placeholder() => ReplyAction::Update { id: message.id },
        _ => ReplyAction::Append { id: Uuid::new_v4() },
    }
}

/// Store `text` as the assistant reply of a chat.
///
/// Returns `None` without writing when the chat was deleted in the meantime.
/// `label` only tags the log line (`"success"` or `"error"`).
pub async fn save_assistant_reply(
    store: &dyn PersistenceClient,
    chat_id: Uuid,
    text: &str,
    label: &str,
) -> Result<Option<ReplyAction>> {
    if store.get_chat(chat_id).await?.is_none() {
        tracing::warn!(chat_id = %chat_id, label, "Chat is gone, dropping assistant reply");
        return Ok(None);
    }

    let messages = store.get_messages(chat_id).await?;
    let action = reconcile_reply(messages.last());

    match action {
        ReplyAction::Update { id } => {
            store
                .update_message_parts(id, vec![MessagePart::text(text)])
                .await?;
            tracing::info!(chat_id = %chat_id, message_id = %id, label, "Updated assistant placeholder");
        }
        ReplyAction::Append { id } => {
            store
                .save_messages(vec![Message::assistant(id, chat_id, text)])
                .await?;
            tracing::info!(chat_id = %chat_id, message_id = %id, label, "Saved assistant message");
        }
    }

    Ok(Some(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPersistence;
    use crate::models::{Chat, MessageRole, Visibility};
    use chrono::{Duration, Utc};

    fn placeholder(chat_id: Uuid) -> Message {
        let mut message = Message::assistant(Uuid::new_v4(), chat_id, "");
        message.parts.clear();
        message
    }

    #[test]
    fn test_empty_chat_appends() {
        assert!(matches!(reconcile_reply(None), ReplyAction::Append { .. }));
    }

    #[test]
    fn test_user_tail_appends() {
        let tail = Message::user(Uuid::new_v4(), Uuid::new_v4(), vec![MessagePart::text("hi")]);
        let action = reconcile_reply(Some(&tail));
        assert!(matches!(action, ReplyAction::Append { id } if id != tail.id));
    }

    #[test]
    fn test_filled_assistant_tail_appends() {
        let tail = Message::assistant(Uuid::new_v4(), Uuid::new_v4(), "already answered");
        assert!(matches!(reconcile_reply(Some(&tail)), ReplyAction::Append { .. }));
    }

    #[test]
    fn test_placeholder_tail_updates() {
        let tail = placeholder(Uuid::new_v4());
        assert_eq!(reconcile_reply(Some(&tail)), ReplyAction::Update { id: tail.id });
    }

    #[tokio::test]
    async fn test_save_fills_placeholder_in_place() {
        let store = InMemoryPersistence::new();
        let chat = Chat::new(Uuid::new_v4(), "alice", "t", Visibility::Private);
        store.save_chat(chat.clone()).await.unwrap();

        let mut slot = placeholder(chat.id);
        slot.created_at = Utc::now() - Duration::minutes(3);
        store.save_messages(vec![slot.clone()]).await.unwrap();

        let action = save_assistant_reply(&store, chat.id, "filled", "success").await.unwrap().unwrap();
        assert_eq!(action, ReplyAction::Update { id: slot.id });

        let messages = store.get_messages(chat.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, slot.id);
        assert_eq!(messages[0].created_at, slot.created_at);
        assert_eq!(messages[0].first_text(), Some("filled"));
    }

    #[tokio::test]
    async fn test_save_appends_after_user_message() {
        let store = InMemoryPersistence::new();
        let chat = Chat::new(Uuid::new_v4(), "alice", "t", Visibility::Private);
        store.save_chat(chat.clone()).await.unwrap();
        store
            .save_messages(vec![Message::user(Uuid::new_v4(), chat.id, vec![MessagePart::text("q")])])
            .await
            .unwrap();

        let action = save_assistant_reply(&store, chat.id, "answer", "error").await.unwrap().unwrap();

        let messages = store.get_messages(chat.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        let last = messages.last().unwrap();
        assert_eq!(last.id, action.id());
        assert_eq!(last.role, MessageRole::Assistant);
        assert_eq!(last.first_text(), Some("answer"));
        assert!(last.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_save_skips_deleted_chat() {
        let store = InMemoryPersistence::new();
        let chat = Chat::new(Uuid::new_v4(), "alice", "t", Visibility::Private);
        store.save_chat(chat.clone()).await.unwrap();
        store.delete_chat(chat.id).await.unwrap();

        let action = save_assistant_reply(&store, chat.id, "too late", "success").await.unwrap();

        assert_eq!(action, None);
        assert!(store.get_messages(chat.id).await.unwrap().is_empty());
    }
}
