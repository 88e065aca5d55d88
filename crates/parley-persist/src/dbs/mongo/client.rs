use mongodb::Client;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::trait_client::PersistenceClient;
use crate::models::{Chat, Message, MessagePart, StreamRecord};
use crate::dbs::mongo::models::{parse_id, MongoMessage};
use crate::dbs::mongo::repositories::{MongoChatRepository, MongoMessageRepository, MongoStreamRepository};
use crate::error::{Result, PersistError};

pub struct MongoPersistenceClient {
    chat_repo: MongoChatRepository,
    message_repo: MongoMessageRepository,
    stream_repo: MongoStreamRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self {
            chat_repo: MongoChatRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            stream_repo: MongoStreamRepository::new(&client, database),
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn get_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        self.chat_repo
            .get_chat(&chat_id.to_string())
            .await?
            .map(Chat::try_from)
            .transpose()
    }

    async fn save_chat(&self, chat: Chat) -> Result<()> {
        self.chat_repo.insert_chat(chat.into()).await
    }

    async fn delete_chat(&self, chat_id: Uuid) -> Result<Option<Chat>> {
        let Some(chat) = self.get_chat(chat_id).await? else {
            return Ok(None);
        };

        let id = chat_id.to_string();
        self.message_repo.delete_for_chat(&id).await?;
        self.stream_repo.delete_for_chat(&id).await?;
        self.chat_repo.delete_chat(&id).await?;
        Ok(Some(chat))
    }

    async fn list_chats(&self, user_id: &str, limit: usize) -> Result<Vec<Chat>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.chat_repo
            .list_chats(user_id, limit)
            .await?
            .into_iter()
            .map(Chat::try_from)
            .collect()
    }

    async fn get_messages(&self, chat_id: Uuid) -> Result<Vec<Message>> {
        self.message_repo
            .get_messages(&chat_id.to_string())
            .await?
            .into_iter()
            .map(Message::try_from)
            .collect()
    }

    async fn save_messages(&self, messages: Vec<Message>) -> Result<()> {
        let mut chat_ids: Vec<Uuid> = messages.iter().map(|m| m.chat_id).collect();
        chat_ids.sort_unstable();
        chat_ids.dedup();
        for chat_id in chat_ids {
            if self.chat_repo.get_chat(&chat_id.to_string()).await?.is_none() {
                return Err(PersistError::ChatNotFound(chat_id.to_string()));
            }
        }

        let mongo_messages: Vec<MongoMessage> = messages.into_iter().map(Into::into).collect();
        self.message_repo.insert_messages(mongo_messages).await
    }

    async fn update_message_parts(&self, message_id: Uuid, parts: Vec<MessagePart>) -> Result<()> {
        let id = message_id.to_string();
        if self.message_repo.update_parts(&id, &parts).await? {
            Ok(())
        } else {
            Err(PersistError::MessageNotFound(id))
        }
    }

    async fn count_user_messages_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<u64> {
        let chat_ids = self.chat_repo.chat_ids_for_user(user_id).await?;
        if chat_ids.is_empty() {
            return Ok(0);
        }
        self.message_repo.count_user_messages(chat_ids, since).await
    }

    async fn create_stream_record(&self, record: StreamRecord) -> Result<()> {
        self.stream_repo.insert_stream(record.into()).await
    }

    async fn list_stream_ids(&self, chat_id: Uuid) -> Result<Vec<Uuid>> {
        self.stream_repo
            .list_for_chat(&chat_id.to_string())
            .await?
            .iter()
            .map(|s| parse_id(&s.id))
            .collect()
    }
}
