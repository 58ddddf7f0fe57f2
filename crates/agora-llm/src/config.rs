use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL (defaults to https://api.openai.com/v1); any OpenAI-compatible endpoint works
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request HTTP timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout_secs: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(OPENAI_API_BASE)
    }
}
