use serde::{Deserialize, Serialize};
use super::content::Content;

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System instructions
    System {
        content: Content,
    },

    /// Participant message
    #[serde(rename = "user")]
    Human {
        content: Content,
    },

    /// Assistant message
    #[serde(rename = "assistant")]
    AI {
        content: Content,
    },
}

impl Message {
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: content.into(),
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
        }
    }

    pub fn content(&self) -> &Content {
        match self {
            Self::System { content } | Self::Human { content } | Self::AI { content } => content,
        }
    }
}
