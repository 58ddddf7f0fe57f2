use crate::streaming::StreamEvent;
use crate::types::Message;
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Trait for chat-based LLM interactions
///
/// Provides both streaming and non-streaming completions for conversational use cases.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Streaming chat completion
    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream>;
}

/// Trait for schema-constrained generation
///
/// The returned value is whatever the provider produced under the schema;
/// callers still deserialize and validate it.
#[async_trait]
pub trait StructuredClient: Send + Sync {
    async fn generate_object(&self, request: StructuredRequest) -> Result<StructuredResponse>;
}

/// Trait for speech-to-text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String>;
}

/// Convenience trait for clients that support both chat and structured output
pub trait LLMClient: ChatClient + StructuredClient {}

impl<T: ChatClient + StructuredClient> LLMClient for T {}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: Option<String>,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    /// Name reported to the provider for the schema (`[a-zA-Z0-9_-]`)
    pub schema_name: String,
    pub schema: Value,
    pub options: ChatOptions,
}

impl StructuredRequest {
    pub fn new(
        model: impl Into<String>,
        schema_name: impl Into<String>,
        schema: Value,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            schema_name: schema_name.into(),
            schema,
            options: ChatOptions::default(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct StructuredResponse {
    pub value: Value,
    pub usage: Option<TokenUsage>,
}

#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub model: String,
    pub audio: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub language: Option<String>,
}

impl TranscriptionRequest {
    pub fn new(model: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            model: model.into(),
            audio,
            filename: "recording.webm".to_string(),
            mime_type: "audio/webm".to_string(),
            language: None,
        }
    }

    pub fn with_file(mut self, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        self.filename = filename.into();
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
