use agora_llm::{Transcriber, TranscriptionRequest};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Speech-to-text; the output is ordinary participant text
#[derive(Clone)]
pub struct TranscriptionService {
    transcriber: Arc<dyn Transcriber>,
    config: Arc<EngineConfig>,
}

impl TranscriptionService {
    pub fn new(transcriber: Arc<dyn Transcriber>, config: Arc<EngineConfig>) -> Self {
        Self {
            transcriber,
            config,
        }
    }

    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<String> {
        if audio.is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        let mut request = TranscriptionRequest::new(&self.config.transcription_model, audio);
        if let Some(filename) = filename {
            let mime_type = mime_type.unwrap_or(request.mime_type.as_str()).to_string();
            request = request.with_file(filename, mime_type);
        } else if let Some(mime_type) = mime_type {
            request.mime_type = mime_type.to_string();
        }
        if let Some(language) = &self.config.transcription_language {
            request = request.with_language(language);
        }

        let text = self.transcriber.transcribe(request).await?;
        Ok(text.trim().to_string())
    }
}
