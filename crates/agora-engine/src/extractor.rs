use agora_llm::{ChatOptions, StructuredClient, StructuredRequest};
use agora_persist::{MessageRole, PersistError, PersistenceClient, TopicCatalog, UserProfile};
use agora_types::AttitudeProfile;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::prompts;

pub const PROFILE_SCHEMA_NAME: &str = "attitude_profile";

/// Turns a session transcript into an attitude profile and upserts it
#[derive(Clone)]
pub struct ProfileExtractor {
    store: Arc<dyn PersistenceClient>,
    catalog: Arc<dyn TopicCatalog>,
    llm: Arc<dyn StructuredClient>,
    config: Arc<EngineConfig>,
}

impl ProfileExtractor {
    pub fn new(
        store: Arc<dyn PersistenceClient>,
        catalog: Arc<dyn TopicCatalog>,
        llm: Arc<dyn StructuredClient>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            store,
            catalog,
            llm,
            config,
        }
    }

    /// Extract from the full transcript and replace the stored profile.
    ///
    /// Nothing is written unless the generated object deserializes and
    /// passes validation, so a failed run leaves the previous profile intact.
    pub async fn extract(&self, session_id: &str) -> Result<UserProfile> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;
        let topic = self
            .catalog
            .get_topic(&session.topic_id)
            .await?
            .ok_or_else(|| EngineError::TopicNotFound(session.topic_id.clone()))?;

        let messages = self.store.get_messages(session_id).await?;
        let message_count = messages
            .iter()
            .filter(|m| m.role == MessageRole::User && !prompts::is_start_signal(&m.content))
            .count() as u64;
        let transcript = prompts::transcript(&messages);

        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        let request = StructuredRequest::new(
            &self.config.extraction_model,
            PROFILE_SCHEMA_NAME,
            AttitudeProfile::json_schema(),
            prompts::profile_prompt(&topic, &transcript),
        )
        .with_system(prompts::profile_system_prompt(&self.config.response_language))
        .with_options(options);

        let response = self.llm.generate_object(request).await?;
        let profile: AttitudeProfile = serde_json::from_value(response.value)
            .map_err(|e| EngineError::InvalidOutput(e.to_string()))?;
        profile.validate()?;

        // The session can disappear while the model runs (guest deletion)
        let stored = self
            .store
            .upsert_profile(session_id, &topic.id, profile, message_count)
            .await
            .map_err(|e| match e {
                PersistError::NotFound { .. } => {
                    EngineError::SessionNotFound(session_id.to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(
            session_id,
            topic_id = %topic.id,
            message_count,
            "Profile updated"
        );
        Ok(stored)
    }
}
