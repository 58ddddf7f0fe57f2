use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Models, language and budgets used by the engine components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub chat_model: String,
    pub extraction_model: String,
    pub synthesis_model: String,
    pub transcription_model: String,
    /// Language hint passed to speech-to-text
    pub transcription_language: Option<String>,
    /// Language the moderator and the extracted records are written in
    pub response_language: String,
    pub temperature: Option<f32>,
    /// Wall-clock budget for one assistant reply
    pub turn_timeout: Duration,
    /// Generation attempts before a structurally invalid synthesis is given up on
    pub synthesis_max_attempts: u32,
    /// Reject (and retry) syntheses whose cluster summaries contradict their positions
    pub strict_coherence: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            extraction_model: "gpt-4o".to_string(),
            synthesis_model: "gpt-4o".to_string(),
            transcription_model: "whisper-1".to_string(),
            transcription_language: Some("de".to_string()),
            response_language: "German".to_string(),
            temperature: None,
            turn_timeout: Duration::from_secs(30),
            synthesis_max_attempts: 2,
            strict_coherence: false,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = model.into();
        self
    }

    pub fn with_synthesis_model(mut self, model: impl Into<String>) -> Self {
        self.synthesis_model = model.into();
        self
    }

    pub fn with_transcription(
        mut self,
        model: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        self.transcription_model = model.into();
        self.transcription_language = language;
        self
    }

    pub fn with_response_language(mut self, language: impl Into<String>) -> Self {
        self.response_language = language.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn with_synthesis_attempts(mut self, attempts: u32) -> Self {
        self.synthesis_max_attempts = attempts.max(1);
        self
    }

    pub fn with_strict_coherence(mut self, strict: bool) -> Self {
        self.strict_coherence = strict;
        self
    }
}
