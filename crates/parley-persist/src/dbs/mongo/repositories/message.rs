use mongodb::{Client, Collection, bson, bson::doc};
use futures::TryStreamExt;
use chrono::{DateTime, Utc};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;
use crate::models::MessagePart;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn insert_messages(&self, messages: Vec<MongoMessage>) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(&messages).await?;
        Ok(())
    }

    /// Get all messages for a chat, oldest first
    pub async fn get_messages(&self, chat_id: &str) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "chat_id": chat_id };
        let messages = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    /// Replace the parts of one message; returns whether it existed
    pub async fn update_parts(&self, message_id: &str, parts: &[MessagePart]) -> Result<bool> {
        let filter = doc! { "_id": message_id };
        let update = doc! {
            "$set": { "parts": bson::to_bson(parts)? }
        };
        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count > 0)
    }

    /// Count user-role messages in the given chats created at or after `since`
    pub async fn count_user_messages(
        &self,
        chat_ids: Vec<String>,
        since: DateTime<Utc>,
    ) -> Result<u64> {
        let filter = doc! {
            "chat_id": { "$in": chat_ids },
            "role": "user",
            "created_at": { "$gte": bson::DateTime::from_chrono(since) }
        };
        Ok(self.collection.count_documents(filter).await?)
    }

    pub async fn delete_for_chat(&self, chat_id: &str) -> Result<()> {
        let filter = doc! { "chat_id": chat_id };
        self.collection.delete_many(filter).await?;
        Ok(())
    }
}
