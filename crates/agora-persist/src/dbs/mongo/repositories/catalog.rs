use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::{MongoArtifact, MongoTopic};
use crate::error::Result;

#[derive(Clone)]
pub struct MongoCatalogRepository {
    topics: Collection<MongoTopic>,
    artifacts: Collection<MongoArtifact>,
}

impl MongoCatalogRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let db = client.database(db_name);
        Self {
            topics: db.collection("topics"),
            artifacts: db.collection("artifacts"),
        }
    }

    pub async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<MongoTopic>> {
        Ok(self.topics.find_one(doc! { "slug": slug }).await?)
    }

    pub async fn get_topic(&self, topic_id: &str) -> Result<Option<MongoTopic>> {
        Ok(self.topics.find_one(doc! { "_id": topic_id }).await?)
    }

    pub async fn list_artifacts(&self, topic_id: &str) -> Result<Vec<MongoArtifact>> {
        let artifacts = self
            .artifacts
            .find(doc! { "topic_id": topic_id })
            .sort(doc! { "position": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(artifacts)
    }
}
