use mongodb::{Client, Collection, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoChat;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoChatRepository {
    collection: Collection<MongoChat>,
}

impl MongoChatRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("chats");
        Self { collection }
    }

    pub async fn insert_chat(&self, chat: MongoChat) -> Result<()> {
        self.collection.insert_one(&chat).await?;
        Ok(())
    }

    /// Get chat by ID
    pub async fn get_chat(&self, chat_id: &str) -> Result<Option<MongoChat>> {
        let filter = doc! { "_id": chat_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// List chats for a user, newest first
    pub async fn list_chats(&self, user_id: &str, limit: i64) -> Result<Vec<MongoChat>> {
        let filter = doc! { "user_id": user_id };
        let chats = self.collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(chats)
    }

    /// Ids of every chat owned by a user
    pub async fn chat_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let filter = doc! { "user_id": user_id };
        let chats: Vec<MongoChat> = self.collection
            .find(filter)
            .await?
            .try_collect()
            .await?;
        Ok(chats.into_iter().map(|c| c.id).collect())
    }

    pub async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let filter = doc! { "_id": chat_id };
        self.collection.delete_one(filter).await?;
        Ok(())
    }
}
