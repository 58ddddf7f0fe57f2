//! Scripted in-process client for tests.
//!
//! Replies are queued up front and consumed in order. Every request is
//! recorded so tests can assert on prompts and models.

use crate::streaming::StreamEvent;
use crate::traits::{
    ChatClient, ChatRequest, ChatResponse, EventStream, StructuredClient, StructuredRequest,
    StructuredResponse, Transcriber, TranscriptionRequest,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const DEFAULT_CHAT_REPLY: &str = "Danke für deinen Beitrag. Was wiegt für dich am schwersten?";

#[derive(Default)]
pub struct ScriptedClient {
    chat_replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    objects: Mutex<VecDeque<std::result::Result<Value, String>>>,
    transcripts: Mutex<VecDeque<std::result::Result<String, String>>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    structured_requests: Mutex<Vec<StructuredRequest>>,
    chat_delay: Option<Duration>,
    object_gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every streamed reply (before its first chunk)
    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = Some(delay);
        self
    }

    /// Hold every structured call until the gate is notified
    pub fn with_object_gate(mut self, gate: Arc<Notify>) -> Self {
        self.object_gate = Some(gate);
        self
    }

    pub fn push_chat_reply(&self, reply: impl Into<String>) -> &Self {
        lock(&self.chat_replies).push_back(Ok(reply.into()));
        self
    }

    pub fn push_chat_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.chat_replies).push_back(Err(message.into()));
        self
    }

    pub fn push_object(&self, value: Value) -> &Self {
        lock(&self.objects).push_back(Ok(value));
        self
    }

    pub fn push_object_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.objects).push_back(Err(message.into()));
        self
    }

    pub fn push_transcript(&self, text: impl Into<String>) -> &Self {
        lock(&self.transcripts).push_back(Ok(text.into()));
        self
    }

    pub fn push_transcript_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.transcripts).push_back(Err(message.into()));
        self
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        lock(&self.chat_requests).clone()
    }

    pub fn structured_requests(&self) -> Vec<StructuredRequest> {
        lock(&self.structured_requests).clone()
    }

    pub fn pending_objects(&self) -> usize {
        lock(&self.objects).len()
    }

    fn next_chat_reply(&self, request: ChatRequest) -> Result<String> {
        lock(&self.chat_requests).push(request);
        match lock(&self.chat_replies).pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(DEFAULT_CHAT_REPLY.to_string()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let reply = self.next_chat_reply(request)?;
        Ok(ChatResponse {
            content: Some(reply),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let reply = self.next_chat_reply(request)?;
        let delay = self.chat_delay;

        let chunks: Vec<String> = reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();

        Ok(Box::pin(async_stream::stream! {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            for content in chunks {
                yield Ok(StreamEvent::Message { content });
            }
            yield Ok(StreamEvent::Done { finish_reason: Some("stop".to_string()) });
        }))
    }
}

#[async_trait]
impl StructuredClient for ScriptedClient {
    async fn generate_object(&self, request: StructuredRequest) -> Result<StructuredResponse> {
        let schema_name = request.schema_name.clone();
        lock(&self.structured_requests).push(request);
        if let Some(gate) = &self.object_gate {
            gate.notified().await;
        }
        match lock(&self.objects).pop_front() {
            Some(Ok(value)) => Ok(StructuredResponse { value, usage: None }),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => anyhow::bail!("No scripted object for {}", schema_name),
        }
    }
}

#[async_trait]
impl Transcriber for ScriptedClient {
    async fn transcribe(&self, _request: TranscriptionRequest) -> Result<String> {
        match lock(&self.transcripts).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => anyhow::bail!("No scripted transcript"),
        }
    }
}
