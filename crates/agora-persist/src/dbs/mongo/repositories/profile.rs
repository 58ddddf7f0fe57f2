use agora_types::AttitudeProfile;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

use crate::dbs::mongo::models::MongoProfile;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoProfileRepository {
    collection: Collection<MongoProfile>,
}

impl MongoProfileRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("user_profiles");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let by_session = IndexModel::builder()
            .keys(doc! { "session_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let by_topic = IndexModel::builder()
            .keys(doc! { "topic_id": 1, "updated_at": -1 })
            .build();
        self.collection.create_index(by_session).await?;
        self.collection.create_index(by_topic).await?;
        Ok(())
    }

    /// Full replace of the structured fields; `_id` and `created_at` survive
    pub async fn upsert(
        &self,
        session_id: ObjectId,
        topic_id: &str,
        profile: &AttitudeProfile,
        message_count: u64,
    ) -> Result<MongoProfile> {
        let now = bson::to_bson(&Utc::now())?;
        let update = doc! {
            "$set": {
                "topic_id": topic_id,
                "profile": bson::to_bson(profile)?,
                "message_count": message_count as i64,
                "updated_at": now.clone(),
            },
            "$setOnInsert": {
                "_id": ObjectId::new(),
                "created_at": now,
            }
        };

        self.collection
            .find_one_and_update(doc! { "session_id": session_id }, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal("Profile upsert returned no document".into()))
    }

    pub async fn get_by_session(&self, session_id: ObjectId) -> Result<Option<MongoProfile>> {
        Ok(self.collection.find_one(doc! { "session_id": session_id }).await?)
    }

    pub async fn list_for_topic(&self, topic_id: &str) -> Result<Vec<MongoProfile>> {
        let profiles = self
            .collection
            .find(doc! { "topic_id": topic_id })
            .sort(doc! { "updated_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(profiles)
    }

    pub async fn count_for_topic(&self, topic_id: &str) -> Result<u64> {
        Ok(self
            .collection
            .count_documents(doc! { "topic_id": topic_id })
            .await?)
    }

    pub async fn delete_for_sessions(&self, session_ids: &[ObjectId]) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "session_id": { "$in": session_ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
