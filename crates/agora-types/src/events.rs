use serde::{Deserialize, Serialize};

/// Events emitted while a conversation turn is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Reply text streamed from the generative step (may contain content markers)
    Delta {
        content: String,
    },

    /// Reply persisted; the turn is complete
    Done {
        session_id: String,
        reply: String,
        message_count: u64,
        messages_until_next_update: u64,
        profile_update_dispatched: bool,
    },

    /// Fatal error for this turn
    Error {
        message: String,
    },
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}
