use agora_persist::{ChatMessage, PersistenceClient, UserProfile};
use agora_types::ParticipantIdentity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::extractor::ProfileExtractor;
use crate::prompts::is_start_signal;
use crate::trigger;

/// A participant's profile (if any) with cadence counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStatus {
    pub profile: Option<UserProfile>,
    pub message_count: u64,
    pub messages_until_next_update: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Read side of sessions and profiles, plus explicit regeneration
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn PersistenceClient>,
    extractor: ProfileExtractor,
}

impl ProfileService {
    pub fn new(store: Arc<dyn PersistenceClient>, extractor: ProfileExtractor) -> Self {
        Self { store, extractor }
    }

    /// Without a session this reports an empty state, not an error
    pub async fn get_profile(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ProfileStatus> {
        let Some(session) = self.store.find_session(topic_id, identity).await? else {
            return Ok(ProfileStatus {
                profile: None,
                message_count: 0,
                messages_until_next_update: trigger::messages_until_next_update(0),
            });
        };

        let message_count = self.store.count_participant_messages(&session.id).await?;
        let profile = self.store.get_profile_by_session(&session.id).await?;

        Ok(ProfileStatus {
            profile,
            message_count,
            messages_until_next_update: trigger::messages_until_next_update(message_count),
        })
    }

    /// Manual refresh; unlike the cadence trigger, failures reach the caller
    pub async fn regenerate(&self, session_id: &str) -> Result<UserProfile> {
        self.extractor.extract(session_id).await
    }

    pub async fn list_profiles(&self, topic_id: &str) -> Result<Vec<UserProfile>> {
        Ok(self.store.list_profiles(topic_id).await?)
    }

    pub async fn history(
        &self,
        topic_id: &str,
        identity: &ParticipantIdentity,
    ) -> Result<ChatHistory> {
        let Some(session) = self.store.find_session(topic_id, identity).await? else {
            return Ok(ChatHistory {
                session_id: None,
                messages: Vec::new(),
            });
        };

        let messages = self
            .store
            .get_messages(&session.id)
            .await?
            .into_iter()
            .filter(|m| !is_start_signal(&m.content))
            .collect();

        Ok(ChatHistory {
            session_id: Some(session.id),
            messages,
        })
    }

    /// Remove every session of a guest with its messages and profile
    pub async fn delete_guest(&self, guest_token: &str) -> Result<u64> {
        let deleted = self.store.delete_guest_sessions(guest_token).await?;
        tracing::info!(deleted, "Deleted guest sessions");
        Ok(deleted)
    }
}
