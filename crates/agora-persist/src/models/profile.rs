use agora_types::AttitudeProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest extraction for a session (1:1 with the session, replaced in place)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub session_id: String,
    pub topic_id: String,
    #[serde(flatten)]
    pub profile: AttitudeProfile,
    /// Participant-message count at the time of extraction
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
