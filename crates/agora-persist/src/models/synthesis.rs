use agora_types::{Commonality, TensionField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached cross-profile synthesis, at most one per topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveSynthesis {
    pub id: String,
    pub topic_id: String,
    pub commonalities: Vec<Commonality>,
    pub tension_fields: Vec<TensionField>,
    /// Profile count the synthesis was computed against
    pub profile_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PerspectiveSynthesis {
    pub fn is_stale(&self, live_profile_count: u64) -> bool {
        self.profile_count != live_profile_count
    }
}
