use agora_types::ParticipantIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database-agnostic chat session, one per (topic, identity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub topic_id: String,
    pub user_id: Option<String>,
    /// Never serialized outward: the token is the guest's only credential
    #[serde(skip_serializing, default)]
    pub guest_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(topic_id: impl Into<String>, identity: &ParticipantIdentity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic_id: topic_id.into(),
            user_id: identity.user_id().map(str::to_string),
            guest_token: identity.guest_token().map(str::to_string),
            created_at: Utc::now(),
        }
    }

    pub fn belongs_to(&self, identity: &ParticipantIdentity) -> bool {
        match identity {
            ParticipantIdentity::User(id) => self.user_id.as_deref() == Some(id.as_str()),
            ParticipantIdentity::Guest(token) => {
                self.user_id.is_none() && self.guest_token.as_deref() == Some(token.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Immutable message; `ordinal` is the creation order within the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub ordinal: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_session_is_not_bound_to_user() {
        let guest = ParticipantIdentity::guest("tok-1");
        let session = ChatSession::new("t1", &guest);

        assert!(session.belongs_to(&guest));
        assert!(!session.belongs_to(&ParticipantIdentity::user("tok-1")));
        assert!(session.user_id.is_none());
    }

    #[test]
    fn test_guest_token_not_serialized() {
        let session = ChatSession::new("t1", &ParticipantIdentity::guest("secret"));
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("guestToken").is_none());
        assert_eq!(value["topicId"], "t1");
    }
}
