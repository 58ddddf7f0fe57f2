use agora_types::{Commonality, TensionField};
use chrono::Utc;
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    options::{IndexOptions, ReturnDocument},
    Client, Collection, IndexModel,
};

use crate::dbs::mongo::models::MongoSynthesis;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoSynthesisRepository {
    collection: Collection<MongoSynthesis>,
}

impl MongoSynthesisRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("perspective_syntheses");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let model = IndexModel::builder()
            .keys(doc! { "topic_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(model).await?;
        Ok(())
    }

    pub async fn upsert(
        &self,
        topic_id: &str,
        commonalities: &[Commonality],
        tension_fields: &[TensionField],
        profile_count: u64,
    ) -> Result<MongoSynthesis> {
        let now = bson::to_bson(&Utc::now())?;
        let update = doc! {
            "$set": {
                "commonalities": bson::to_bson(commonalities)?,
                "tension_fields": bson::to_bson(tension_fields)?,
                "profile_count": profile_count as i64,
                "updated_at": now.clone(),
            },
            "$setOnInsert": {
                "_id": ObjectId::new(),
                "created_at": now,
            }
        };

        self.collection
            .find_one_and_update(doc! { "topic_id": topic_id }, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| PersistError::Internal("Synthesis upsert returned no document".into()))
    }

    pub async fn get(&self, topic_id: &str) -> Result<Option<MongoSynthesis>> {
        Ok(self.collection.find_one(doc! { "topic_id": topic_id }).await?)
    }
}
