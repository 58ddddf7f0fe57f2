use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Document},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

use agora_types::ParticipantIdentity;

use crate::dbs::mongo::models::MongoSession;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoSessionRepository {
    collection: Collection<MongoSession>,
}

impl MongoSessionRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("chat_sessions");
        Self { collection }
    }

    /// Unique compound keys make concurrent get-or-create converge on one row
    pub async fn ensure_indexes(&self) -> Result<()> {
        let by_user = IndexModel::builder()
            .keys(doc! { "topic_id": 1, "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "user_id": { "$type": "string" } })
                    .build(),
            )
            .build();
        let by_guest = IndexModel::builder()
            .keys(doc! { "topic_id": 1, "guest_token": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "guest_token": { "$type": "string" } })
                    .build(),
            )
            .build();

        self.collection.create_index(by_user).await?;
        self.collection.create_index(by_guest).await?;
        Ok(())
    }

    fn identity_filter(topic_id: &str, identity: &ParticipantIdentity) -> Document {
        match identity {
            ParticipantIdentity::User(id) => doc! { "topic_id": topic_id, "user_id": id },
            ParticipantIdentity::Guest(token) => doc! {
                "topic_id": topic_id,
                "guest_token": token,
                "user_id": { "$exists": false },
            },
        }
    }

    pub async fn find(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<Option<MongoSession>> {
        let filter = Self::identity_filter(topic_id, identity);
        Ok(self.collection.find_one(filter).await?)
    }

    /// Upsert by compound key; the insert branch only sets the creation fields
    pub async fn get_or_create(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<MongoSession> {
        let filter = Self::identity_filter(topic_id, identity);
        let update = doc! {
            "$setOnInsert": {
                "_id": ObjectId::new(),
                "message_seq": 0_i64,
                "created_at": bson::to_bson(&Utc::now())?,
            }
        };

        self.collection
            .find_one_and_update(filter, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal("Session upsert returned no document".into()))
    }

    pub async fn get(&self, session_id: ObjectId) -> Result<Option<MongoSession>> {
        Ok(self.collection.find_one(doc! { "_id": session_id }).await?)
    }

    /// Reserve the next message ordinal for a session
    pub async fn next_ordinal(&self, session_id: ObjectId) -> Result<i64> {
        let session = self
            .collection
            .find_one_and_update(
                doc! { "_id": session_id },
                doc! { "$inc": { "message_seq": 1_i64 } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::not_found("Session", session_id.to_hex()))?;
        Ok(session.message_seq - 1)
    }

    pub async fn list_guest_sessions(&self, guest_token: &str) -> Result<Vec<ObjectId>> {
        let sessions: Vec<MongoSession> = self
            .collection
            .find(doc! { "guest_token": guest_token })
            .await?
            .try_collect()
            .await?;
        Ok(sessions.into_iter().map(|s| s.id).collect())
    }

    pub async fn delete_many(&self, ids: &[ObjectId]) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }
}
