use agora_types::{AttitudeProfile, Commonality, ParticipantIdentity, TensionField};
use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Artifact, ChatMessage, ChatSession, MessageRole, PerspectiveSynthesis, Topic, UserProfile,
};

/// Read-only view of topics and their curated material
#[async_trait]
pub trait TopicCatalog: Send + Sync {
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>>;

    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>>;

    /// All artifacts of a topic, in catalog order
    async fn list_artifacts(&self, topic_id: &str) -> Result<Vec<Artifact>>;
}

/// Trait for database persistence operations
///
/// Implementations provide the compound-key lookups and upserts the
/// deliberation pipeline relies on. Every write is all-or-nothing per call.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Find the session for (topic, identity) without creating one
    async fn find_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<Option<ChatSession>>;

    /// Return the session for (topic, identity), creating it if absent.
    /// Repeated and concurrent calls with the same identity yield the same session.
    async fn get_or_create_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ChatSession>;

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>>;

    /// Append a message with the next ordinal of the session
    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage>;

    /// All messages of a session in creation order
    async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>>;

    /// Store-side count of `role = user` messages
    async fn count_participant_messages(&self, session_id: &str) -> Result<u64>;

    /// Delete every session created under a guest token together with its
    /// messages and profile. Returns the number of deleted sessions.
    async fn delete_guest_sessions(&self, guest_token: &str) -> Result<u64>;

    /// Create or fully replace the profile keyed by session
    async fn upsert_profile(
        &self,
        session_id: &str,
        topic_id: &str,
        profile: AttitudeProfile,
        message_count: u64,
    ) -> Result<UserProfile>;

    async fn get_profile_by_session(&self, session_id: &str) -> Result<Option<UserProfile>>;

    /// Profiles of a topic, most recently updated first
    async fn list_profiles(&self, topic_id: &str) -> Result<Vec<UserProfile>>;

    async fn count_profiles(&self, topic_id: &str) -> Result<u64>;

    /// Create or replace the synthesis keyed by topic
    async fn upsert_synthesis(
        &self,
        topic_id: &str,
        commonalities: Vec<Commonality>,
        tension_fields: Vec<TensionField>,
        profile_count: u64,
    ) -> Result<PerspectiveSynthesis>;

    async fn get_synthesis(&self, topic_id: &str) -> Result<Option<PerspectiveSynthesis>>;

    /// Check that the backend is reachable
    async fn ping(&self) -> Result<()>;
}
