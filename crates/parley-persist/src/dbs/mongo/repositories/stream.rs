use mongodb::{Client, Collection, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoStream;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoStreamRepository {
    collection: Collection<MongoStream>,
}

impl MongoStreamRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("streams");
        Self { collection }
    }

    pub async fn insert_stream(&self, stream: MongoStream) -> Result<()> {
        self.collection.insert_one(&stream).await?;
        Ok(())
    }

    pub async fn list_for_chat(&self, chat_id: &str) -> Result<Vec<MongoStream>> {
        let filter = doc! { "chat_id": chat_id };
        let streams = self.collection
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(streams)
    }

    pub async fn delete_for_chat(&self, chat_id: &str) -> Result<()> {
        let filter = doc! { "chat_id": chat_id };
        self.collection.delete_many(filter).await?;
        Ok(())
    }
}
