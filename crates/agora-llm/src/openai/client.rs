// OpenAI-compatible client implementation

use crate::config::OpenAIConfig;
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{
    ChatClient, ChatOptions, ChatRequest, ChatResponse, EventStream, StructuredClient,
    StructuredRequest, StructuredResponse, TokenUsage, Transcriber, TranscriptionRequest,
};
use crate::types::{Content, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key against the default endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&OpenAIConfig::new(api_key))
    }

    pub fn from_config(config: &OpenAIConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("Invalid API key format")?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url().to_string(),
        })
    }

    /// Build chat completion request payload
    fn build_chat_request(
        &self,
        model: &str,
        messages: Vec<Message>,
        options: &ChatOptions,
        stream: bool,
    ) -> Value {
        let mut request = Map::new();
        request.insert("model".to_string(), Value::from(model));
        request.insert(
            "messages".to_string(),
            Value::Array(messages.into_iter().map(convert_message).collect()),
        );
        request.insert("stream".to_string(), Value::Bool(stream));
        apply_options(&mut request, model, options);
        Value::Object(request)
    }

    /// Build a schema-constrained request (`response_format: json_schema`, strict)
    fn build_structured_request(&self, request: StructuredRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::human(request.prompt));

        let mut payload = Map::new();
        payload.insert("model".to_string(), Value::from(request.model.as_str()));
        payload.insert(
            "messages".to_string(),
            Value::Array(messages.into_iter().map(convert_message).collect()),
        );
        payload.insert(
            "response_format".to_string(),
            serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                }
            }),
        );
        apply_options(&mut payload, &request.model, &request.options);
        Value::Object(payload)
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        ensure_success(response).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
    }
    Ok(response)
}

// o1 and gpt-5 models reject temperature and use max_completion_tokens
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("o1") || model.starts_with("o3") || model.starts_with("gpt-5")
}

fn apply_options(obj: &mut Map<String, Value>, model: &str, options: &ChatOptions) {
    let reasoning = is_reasoning_model(model);

    if let Some(temp) = options.temperature {
        if !reasoning {
            obj.insert("temperature".to_string(), serde_json::json!(temp));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        let token_field = if reasoning {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
    }
}

fn convert_message(message: Message) -> Value {
    let role = message.role().to_string();
    let content = match message {
        Message::System { content } | Message::Human { content } | Message::AI { content } => {
            content
        }
    };
    serde_json::json!({
        "role": role,
        "content": convert_content(content),
    })
}

fn convert_content(content: Content) -> Value {
    match content {
        Content::Text(s) => Value::String(s),
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload =
            self.build_chat_request(&request.model, request.messages, &request.options, false);

        let raw: OpenAIChatResponse = self
            .post_json("/chat/completions", &payload)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice.and_then(|c| c.message.content.clone()),
            usage: raw.usage.as_ref().map(Usage::to_token_usage),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload =
            self.build_chat_request(&request.model, request.messages, &request.options, true);

        let response = self.post_json("/chat/completions", &payload).await?;
        Ok(parse_chat_sse_stream(response))
    }
}

#[async_trait]
impl StructuredClient for OpenAIClient {
    async fn generate_object(&self, request: StructuredRequest) -> Result<StructuredResponse> {
        let schema_name = request.schema_name.clone();
        let payload = self.build_structured_request(request);

        let raw: OpenAIChatResponse = self
            .post_json("/chat/completions", &payload)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        let message = raw
            .choices
            .first()
            .map(|c| &c.message)
            .ok_or_else(|| anyhow::anyhow!("Structured response for {} had no choices", schema_name))?;

        if let Some(refusal) = &message.refusal {
            anyhow::bail!("Model refused structured output for {}: {}", schema_name, refusal);
        }

        let content = message
            .content
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Structured response for {} had no content", schema_name))?;

        let value: Value = serde_json::from_str(content)
            .with_context(|| format!("Structured output for {} is not valid JSON", schema_name))?;

        tracing::debug!(schema = %schema_name, "Structured output received");

        Ok(StructuredResponse {
            value,
            usage: raw.usage.as_ref().map(Usage::to_token_usage),
        })
    }
}

#[async_trait]
impl Transcriber for OpenAIClient {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(request.audio)
            .file_name(request.filename)
            .mime_str(&request.mime_type)
            .context("Invalid audio mime type")?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", request.model)
            .part("file", part);
        if let Some(language) = request.language {
            form = form.text("language", language);
        }

        let response = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?;

        let raw: TranscriptionResponse = ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(raw.text)
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    fn to_token_usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.prompt_tokens,
            output_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TranscriptionResponse {
    text: String,
}
