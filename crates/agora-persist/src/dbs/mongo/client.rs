use agora_types::{AttitudeProfile, Commonality, ParticipantIdentity, TensionField};
use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Client, Database,
};

use crate::dbs::mongo::repositories::{
    MongoCatalogRepository, MongoMessageRepository, MongoProfileRepository,
    MongoSessionRepository, MongoSynthesisRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{
    Artifact, ChatMessage, ChatSession, MessageRole, PerspectiveSynthesis, Topic, UserProfile,
};
use crate::trait_client::{PersistenceClient, TopicCatalog};

pub struct MongoPersistenceClient {
    database: Database,
    catalog_repo: MongoCatalogRepository,
    session_repo: MongoSessionRepository,
    message_repo: MongoMessageRepository,
    profile_repo: MongoProfileRepository,
    synthesis_repo: MongoSynthesisRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create the client and make sure the unique
    /// indexes backing the upserts exist
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let persist = Self {
            database: client.database(database),
            catalog_repo: MongoCatalogRepository::new(&client, database),
            session_repo: MongoSessionRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            profile_repo: MongoProfileRepository::new(&client, database),
            synthesis_repo: MongoSynthesisRepository::new(&client, database),
        };
        persist.ensure_indexes().await?;

        tracing::info!(database, "Connected to MongoDB");
        Ok(persist)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        self.session_repo.ensure_indexes().await?;
        self.message_repo.ensure_indexes().await?;
        self.profile_repo.ensure_indexes().await?;
        self.synthesis_repo.ensure_indexes().await?;
        Ok(())
    }
}

fn parse_object_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[async_trait]
impl TopicCatalog for MongoPersistenceClient {
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        Ok(self.catalog_repo.get_topic_by_slug(slug).await?.map(Into::into))
    }

    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        Ok(self.catalog_repo.get_topic(topic_id).await?.map(Into::into))
    }

    async fn list_artifacts(&self, topic_id: &str) -> Result<Vec<Artifact>> {
        let artifacts = self.catalog_repo.list_artifacts(topic_id).await?;
        Ok(artifacts.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn find_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<Option<ChatSession>> {
        Ok(self.session_repo.find(topic_id, identity).await?.map(Into::into))
    }

    async fn get_or_create_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ChatSession> {
        Ok(self.session_repo.get_or_create(topic_id, identity).await?.into())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        // Foreign ids cannot name a stored session
        let Ok(object_id) = ObjectId::parse_str(session_id) else {
            return Ok(None);
        };
        Ok(self.session_repo.get(object_id).await?.map(Into::into))
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let object_id = parse_object_id(session_id)?;
        let ordinal = self.session_repo.next_ordinal(object_id).await?;
        let message = self
            .message_repo
            .insert(object_id, role, content, ordinal)
            .await?;
        Ok(message.into())
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let object_id = parse_object_id(session_id)?;
        let messages = self.message_repo.get_messages(object_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn count_participant_messages(&self, session_id: &str) -> Result<u64> {
        let object_id = parse_object_id(session_id)?;
        self.message_repo
            .count_by_role(object_id, MessageRole::User)
            .await
    }

    async fn delete_guest_sessions(&self, guest_token: &str) -> Result<u64> {
        let session_ids = self.session_repo.list_guest_sessions(guest_token).await?;
        if session_ids.is_empty() {
            return Ok(0);
        }

        self.message_repo.delete_for_sessions(&session_ids).await?;
        self.profile_repo.delete_for_sessions(&session_ids).await?;
        self.session_repo.delete_many(&session_ids).await
    }

    async fn upsert_profile(
        &self,
        session_id: &str,
        topic_id: &str,
        profile: AttitudeProfile,
        message_count: u64,
    ) -> Result<UserProfile> {
        let object_id = parse_object_id(session_id)?;
        if self.session_repo.get(object_id).await?.is_none() {
            return Err(PersistError::not_found("Session", session_id));
        }
        let stored = self
            .profile_repo
            .upsert(object_id, topic_id, &profile, message_count)
            .await?;

        // The session may have been deleted between the check and the write
        if self.session_repo.get(object_id).await?.is_none() {
            self.profile_repo.delete_for_sessions(&[object_id]).await?;
            return Err(PersistError::not_found("Session", session_id));
        }
        Ok(stored.into())
    }

    async fn get_profile_by_session(&self, session_id: &str) -> Result<Option<UserProfile>> {
        let Ok(object_id) = ObjectId::parse_str(session_id) else {
            return Ok(None);
        };
        Ok(self.profile_repo.get_by_session(object_id).await?.map(Into::into))
    }

    async fn list_profiles(&self, topic_id: &str) -> Result<Vec<UserProfile>> {
        let profiles = self.profile_repo.list_for_topic(topic_id).await?;
        Ok(profiles.into_iter().map(Into::into).collect())
    }

    async fn count_profiles(&self, topic_id: &str) -> Result<u64> {
        self.profile_repo.count_for_topic(topic_id).await
    }

    async fn upsert_synthesis(
        &self,
        topic_id: &str,
        commonalities: Vec<Commonality>,
        tension_fields: Vec<TensionField>,
        profile_count: u64,
    ) -> Result<PerspectiveSynthesis> {
        let stored = self
            .synthesis_repo
            .upsert(topic_id, &commonalities, &tension_fields, profile_count)
            .await?;
        Ok(stored.into())
    }

    async fn get_synthesis(&self, topic_id: &str) -> Result<Option<PerspectiveSynthesis>> {
        Ok(self.synthesis_repo.get(topic_id).await?.map(Into::into))
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
