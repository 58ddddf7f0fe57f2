use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Client, Collection, IndexModel,
};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;
use crate::models::MessageRole;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("chat_messages");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let model = IndexModel::builder()
            .keys(doc! { "session_id": 1, "ordinal": 1 })
            .build();
        self.collection.create_index(model).await?;
        Ok(())
    }

    pub async fn insert(
        &self,
        session_id: ObjectId,
        role: MessageRole,
        content: &str,
        ordinal: i64,
    ) -> Result<MongoMessage> {
        let message = MongoMessage {
            id: ObjectId::new(),
            session_id,
            role,
            content: content.to_string(),
            ordinal,
            created_at: Utc::now(),
        };
        self.collection.insert_one(&message).await?;
        Ok(message)
    }

    /// All messages for a session in creation order
    pub async fn get_messages(&self, session_id: ObjectId) -> Result<Vec<MongoMessage>> {
        let messages = self
            .collection
            .find(doc! { "session_id": session_id })
            .sort(doc! { "ordinal": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    pub async fn count_by_role(&self, session_id: ObjectId, role: MessageRole) -> Result<u64> {
        let role = match role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        let count = self
            .collection
            .count_documents(doc! { "session_id": session_id, "role": role })
            .await?;
        Ok(count)
    }

    pub async fn delete_for_sessions(&self, session_ids: &[ObjectId]) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "session_id": { "$in": session_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
