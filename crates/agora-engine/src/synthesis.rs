use agora_llm::{ChatOptions, StructuredClient, StructuredRequest};
use agora_persist::{PerspectiveSynthesis, PersistenceClient, UserProfile};
use agora_types::{SchemaViolation, SynthesisDraft};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::prompts;

pub const SYNTHESIS_SCHEMA_NAME: &str = "perspective_synthesis";

/// Fewest profiles a comparison makes sense for
pub const MIN_PROFILES: usize = 2;

pub const NOT_ENOUGH_DATA_MESSAGE: &str = "Mindestens 2 Perspektiven nötig für Vergleich";

/// Cached synthesis of a topic and whether it still matches the population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisStatus {
    pub synthesis: Option<PerspectiveSynthesis>,
    pub profile_count: u64,
    pub is_stale: bool,
    pub needs_generation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    #[serde(rename_all = "camelCase")]
    Ready {
        synthesis: PerspectiveSynthesis,
        /// False when the cached synthesis was still fresh
        generated: bool,
    },
    #[serde(rename_all = "camelCase")]
    NotEnoughData { profile_count: u64, message: String },
}

/// Cross-profile commonalities and tension fields, cached per topic
#[derive(Clone)]
pub struct SynthesisEngine {
    store: Arc<dyn PersistenceClient>,
    llm: Arc<dyn StructuredClient>,
    config: Arc<EngineConfig>,
}

impl SynthesisEngine {
    pub fn new(
        store: Arc<dyn PersistenceClient>,
        llm: Arc<dyn StructuredClient>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self { store, llm, config }
    }

    pub async fn status(&self, topic_id: &str) -> Result<SynthesisStatus> {
        let synthesis = self.store.get_synthesis(topic_id).await?;
        let profile_count = self.store.count_profiles(topic_id).await?;
        let is_stale = synthesis
            .as_ref()
            .map(|s| s.is_stale(profile_count))
            .unwrap_or(false);

        Ok(SynthesisStatus {
            needs_generation: synthesis.is_none() || is_stale,
            synthesis,
            profile_count,
            is_stale,
        })
    }

    /// Serve the cache when fresh, generate otherwise
    pub async fn request(&self, topic_id: &str) -> Result<SynthesisOutcome> {
        let status = self.status(topic_id).await?;
        if let (Some(synthesis), false) = (status.synthesis, status.is_stale) {
            return Ok(SynthesisOutcome::Ready {
                synthesis,
                generated: false,
            });
        }
        self.regenerate(topic_id).await
    }

    /// Generate from the current population regardless of the cache
    pub async fn regenerate(&self, topic_id: &str) -> Result<SynthesisOutcome> {
        let profiles = self.store.list_profiles(topic_id).await?;
        if profiles.len() < MIN_PROFILES {
            return Ok(SynthesisOutcome::NotEnoughData {
                profile_count: profiles.len() as u64,
                message: NOT_ENOUGH_DATA_MESSAGE.to_string(),
            });
        }

        let profile_ids: Vec<String> = profiles.iter().map(|p| p.id.clone()).collect();
        let mut draft = self.generate_valid_draft(&profiles, &profile_ids).await?;
        draft.attribute_commonalities(&profile_ids);

        // Count of the population actually synthesized, not a fresh recount
        let synthesis = self
            .store
            .upsert_synthesis(
                topic_id,
                draft.commonalities,
                draft.tension_fields,
                profiles.len() as u64,
            )
            .await?;

        tracing::info!(
            topic_id,
            profile_count = synthesis.profile_count,
            tension_fields = synthesis.tension_fields.len(),
            "Synthesis generated"
        );
        Ok(SynthesisOutcome::Ready {
            synthesis,
            generated: true,
        })
    }

    async fn generate_valid_draft(
        &self,
        profiles: &[UserProfile],
        profile_ids: &[String],
    ) -> Result<SynthesisDraft> {
        let base_prompt = prompts::synthesis_prompt(profiles);
        let mut prompt = base_prompt.clone();
        let mut last_error = None;

        for attempt in 1..=self.config.synthesis_max_attempts {
            let violation = match self.generate_draft(prompt.clone()).await {
                Ok(draft) => match self.check(&draft, profile_ids) {
                    Ok(()) => return Ok(draft),
                    Err(violation) => violation,
                },
                Err(EngineError::InvalidOutput(detail)) => {
                    last_error = Some(EngineError::InvalidOutput(detail.clone()));
                    tracing::warn!(attempt, "Synthesis output unreadable: {}", detail);
                    prompt = format!("{}{}", base_prompt, prompts::synthesis_correction(&detail));
                    continue;
                }
                Err(e) => return Err(e),
            };

            tracing::warn!(attempt, "Synthesis draft rejected: {}", violation);
            prompt = format!(
                "{}{}",
                base_prompt,
                prompts::synthesis_correction(&violation.to_string())
            );
            last_error = Some(EngineError::Schema(violation));
        }

        Err(last_error.unwrap_or_else(|| {
            EngineError::InvalidOutput("No synthesis attempt was made".to_string())
        }))
    }

    async fn generate_draft(&self, prompt: String) -> Result<SynthesisDraft> {
        let mut options = ChatOptions::new();
        if let Some(temp) = self.config.temperature {
            options = options.temperature(temp);
        }
        let request = StructuredRequest::new(
            &self.config.synthesis_model,
            SYNTHESIS_SCHEMA_NAME,
            SynthesisDraft::json_schema(),
            prompt,
        )
        .with_options(options);

        let response = self.llm.generate_object(request).await?;
        serde_json::from_value(response.value)
            .map_err(|e| EngineError::InvalidOutput(e.to_string()))
    }

    /// Structural rules always reject; label/position mismatches only
    /// reject in strict mode.
    fn check(
        &self,
        draft: &SynthesisDraft,
        profile_ids: &[String],
    ) -> std::result::Result<(), SchemaViolation> {
        draft.validate(profile_ids)?;

        let mut issues = draft.coherence_issues();
        if issues.is_empty() {
            return Ok(());
        }
        if self.config.strict_coherence {
            return Err(issues.swap_remove(0).into_violation());
        }
        for issue in &issues {
            tracing::warn!(
                field = issue.field,
                cluster = issue.cluster,
                position = issue.position,
                "Cluster summary does not match its position"
            );
        }
        Ok(())
    }
}
