//! In-process backend. Every operation takes the single state lock once,
//! so each call is atomic with respect to the others.

use agora_types::{AttitudeProfile, Commonality, ParticipantIdentity, TensionField};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{
    Artifact, ChatMessage, ChatSession, MessageRole, PerspectiveSynthesis, Topic, UserProfile,
};
use crate::trait_client::{PersistenceClient, TopicCatalog};

#[derive(Default)]
struct State {
    topics: Vec<Topic>,
    artifacts: Vec<Artifact>,
    sessions: Vec<ChatSession>,
    messages: HashMap<String, Vec<ChatMessage>>,
    profiles: HashMap<String, UserProfile>,
    syntheses: HashMap<String, PerspectiveSynthesis>,
}

#[derive(Default)]
pub struct MemoryPersistenceClient {
    state: RwLock<State>,
}

impl MemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a topic (the catalog is owned elsewhere in production)
    pub async fn insert_topic(&self, topic: Topic) {
        let mut state = self.state.write().await;
        state.topics.retain(|t| t.id != topic.id);
        state.topics.push(topic);
    }

    pub async fn insert_artifact(&self, artifact: Artifact) {
        let mut state = self.state.write().await;
        state.artifacts.retain(|a| a.id != artifact.id);
        state.artifacts.push(artifact);
    }

    /// Remove a profile directly (used to simulate population drift)
    pub async fn remove_profile(&self, session_id: &str) -> bool {
        self.state.write().await.profiles.remove(session_id).is_some()
    }
}

fn find_session_in<'a>(
    sessions: &'a [ChatSession],
    topic_id: &str,
    identity: &ParticipantIdentity,
) -> Option<&'a ChatSession> {
    sessions
        .iter()
        .find(|s| s.topic_id == topic_id && s.belongs_to(identity))
}

#[async_trait]
impl TopicCatalog for MemoryPersistenceClient {
    async fn get_topic_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        let state = self.state.read().await;
        Ok(state.topics.iter().find(|t| t.slug == slug).cloned())
    }

    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        let state = self.state.read().await;
        Ok(state.topics.iter().find(|t| t.id == topic_id).cloned())
    }

    async fn list_artifacts(&self, topic_id: &str) -> Result<Vec<Artifact>> {
        let state = self.state.read().await;
        Ok(state
            .artifacts
            .iter()
            .filter(|a| a.topic_id == topic_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PersistenceClient for MemoryPersistenceClient {
    async fn find_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<Option<ChatSession>> {
        let state = self.state.read().await;
        Ok(find_session_in(&state.sessions, topic_id, identity).cloned())
    }

    async fn get_or_create_session(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ChatSession> {
        let mut state = self.state.write().await;
        if let Some(existing) = find_session_in(&state.sessions, topic_id, identity) {
            return Ok(existing.clone());
        }

        let session = ChatSession::new(topic_id, identity);
        tracing::debug!(session_id = %session.id, topic_id, "Created chat session");
        state.sessions.push(session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let state = self.state.read().await;
        Ok(state.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let mut state = self.state.write().await;
        if !state.sessions.iter().any(|s| s.id == session_id) {
            return Err(PersistError::not_found("Session", session_id));
        }

        let log = state.messages.entry(session_id.to_string()).or_default();
        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            ordinal: log.last().map_or(0, |m| m.ordinal + 1),
            created_at: Utc::now(),
        };
        log.push(message.clone());
        Ok(message)
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let state = self.state.read().await;
        Ok(state.messages.get(session_id).cloned().unwrap_or_default())
    }

    async fn count_participant_messages(&self, session_id: &str) -> Result<u64> {
        let state = self.state.read().await;
        let count = state
            .messages
            .get(session_id)
            .map_or(0, |log| log.iter().filter(|m| m.role == MessageRole::User).count());
        Ok(count as u64)
    }

    async fn delete_guest_sessions(&self, guest_token: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let doomed: Vec<String> = state
            .sessions
            .iter()
            .filter(|s| s.guest_token.as_deref() == Some(guest_token))
            .map(|s| s.id.clone())
            .collect();

        state.sessions.retain(|s| !doomed.contains(&s.id));
        for session_id in &doomed {
            state.messages.remove(session_id);
            state.profiles.remove(session_id);
        }
        Ok(doomed.len() as u64)
    }

    async fn upsert_profile(
        &self,
        session_id: &str,
        topic_id: &str,
        profile: AttitudeProfile,
        message_count: u64,
    ) -> Result<UserProfile> {
        let mut state = self.state.write().await;
        // A guest deleted while extraction ran must not come back as an orphan
        if !state.sessions.iter().any(|s| s.id == session_id) {
            return Err(PersistError::not_found("Session", session_id));
        }
        let now = Utc::now();

        let record = match state.profiles.get(session_id) {
            Some(existing) => UserProfile {
                id: existing.id.clone(),
                session_id: session_id.to_string(),
                topic_id: topic_id.to_string(),
                profile,
                message_count,
                created_at: existing.created_at,
                updated_at: now,
            },
            None => UserProfile {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                topic_id: topic_id.to_string(),
                profile,
                message_count,
                created_at: now,
                updated_at: now,
            },
        };

        state.profiles.insert(session_id.to_string(), record.clone());
        Ok(record)
    }

    async fn get_profile_by_session(&self, session_id: &str) -> Result<Option<UserProfile>> {
        let state = self.state.read().await;
        Ok(state.profiles.get(session_id).cloned())
    }

    async fn list_profiles(&self, topic_id: &str) -> Result<Vec<UserProfile>> {
        let state = self.state.read().await;
        let mut profiles: Vec<UserProfile> = state
            .profiles
            .values()
            .filter(|p| p.topic_id == topic_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(profiles)
    }

    async fn count_profiles(&self, topic_id: &str) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.profiles.values().filter(|p| p.topic_id == topic_id).count() as u64)
    }

    async fn upsert_synthesis(
        &self,
        topic_id: &str,
        commonalities: Vec<Commonality>,
        tension_fields: Vec<TensionField>,
        profile_count: u64,
    ) -> Result<PerspectiveSynthesis> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let (id, created_at) = state
            .syntheses
            .get(topic_id)
            .map(|s| (s.id.clone(), s.created_at))
            .unwrap_or_else(|| (uuid::Uuid::new_v4().to_string(), now));

        let record = PerspectiveSynthesis {
            id,
            topic_id: topic_id.to_string(),
            commonalities,
            tension_fields,
            profile_count,
            created_at,
            updated_at: now,
        };
        state.syntheses.insert(topic_id.to_string(), record.clone());
        Ok(record)
    }

    async fn get_synthesis(&self, topic_id: &str) -> Result<Option<PerspectiveSynthesis>> {
        let state = self.state.read().await;
        Ok(state.syntheses.get(topic_id).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
