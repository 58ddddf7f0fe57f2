use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a participant within a topic.
///
/// Either an authenticated user id or a client-issued guest token, never both.
/// Guest tokens are opaque: the server accepts and stores whatever the client
/// presents and never issues one itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ParticipantIdentity {
    User(String),
    Guest(String),
}

impl ParticipantIdentity {
    /// Resolve an identity from an optional authenticated user and an optional
    /// guest token. The authenticated user wins when both are present; blank
    /// values count as absent. `None` means "no session", not an error.
    pub fn resolve(user_id: Option<&str>, guest_token: Option<&str>) -> Option<Self> {
        let user_id = user_id.map(str::trim).filter(|s| !s.is_empty());
        let guest_token = guest_token.map(str::trim).filter(|s| !s.is_empty());

        match (user_id, guest_token) {
            (Some(user), _) => Some(Self::User(user.to_string())),
            (None, Some(token)) => Some(Self::Guest(token.to_string())),
            (None, None) => None,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }

    pub fn guest(token: impl Into<String>) -> Self {
        Self::Guest(token.into())
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Guest(_) => None,
        }
    }

    pub fn guest_token(&self) -> Option<&str> {
        match self {
            Self::Guest(token) => Some(token),
            Self::User(_) => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

impl fmt::Display for ParticipantIdentity {
    // Guest tokens are bearer secrets, only a prefix goes into logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{}", id),
            Self::Guest(token) => {
                let prefix: String = token.chars().take(8).collect();
                write!(f, "guest:{}…", prefix)
            }
        }
    }
}
