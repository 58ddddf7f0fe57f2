use anyhow::Result;
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::{parse_sse_stream, SseLineParser};
use crate::traits::EventStream;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    pub index: u32,
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// Parses chat-completion chunks (`choices[0].delta.content`)
pub struct ChatChunkParser;

impl SseLineParser for ChatChunkParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse chat chunk: {}", e))?;
        Ok(chunk.to_stream_events())
    }
}

pub fn parse_chat_sse_stream(response: Response) -> EventStream {
    parse_sse_stream(response.bytes_stream(), ChatChunkParser)
}
