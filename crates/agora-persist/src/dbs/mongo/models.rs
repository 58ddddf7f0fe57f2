use agora_types::{AttitudeProfile, Commonality, TensionField};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::{
    Artifact, ChatMessage, ChatSession, MessageRole, PerspectiveSynthesis, Topic, UserProfile,
};

/// Topics and artifacts are written by the catalog owner, so their ids are
/// opaque strings rather than ObjectIds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTopic {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub central_question: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoArtifact {
    #[serde(rename = "_id")]
    pub id: String,
    pub topic_id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub takeaways: Vec<String>,
    #[serde(default)]
    pub position: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSession {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub topic_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_token: Option<String>,
    /// Last issued message ordinal + 1
    #[serde(default)]
    pub message_seq: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub session_id: ObjectId,
    pub role: MessageRole,
    pub content: String,
    pub ordinal: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub session_id: ObjectId,
    pub topic_id: String,
    pub profile: AttitudeProfile,
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSynthesis {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub topic_id: String,
    pub commonalities: Vec<Commonality>,
    pub tension_fields: Vec<TensionField>,
    pub profile_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversions from MongoDB-specific to database-agnostic models

impl From<MongoTopic> for Topic {
    fn from(topic: MongoTopic) -> Self {
        Self {
            id: topic.id,
            slug: topic.slug,
            title: topic.title,
            description: topic.description,
            scope: topic.scope,
            central_question: topic.central_question,
            starts_at: topic.starts_at,
            ends_at: topic.ends_at,
        }
    }
}

impl From<MongoArtifact> for Artifact {
    fn from(artifact: MongoArtifact) -> Self {
        Self {
            id: artifact.id,
            topic_id: artifact.topic_id,
            url: artifact.url,
            title: artifact.title,
            description: artifact.description,
            tags: artifact.tags,
            takeaways: artifact.takeaways,
        }
    }
}

impl From<MongoSession> for ChatSession {
    fn from(session: MongoSession) -> Self {
        Self {
            id: session.id.to_hex(),
            topic_id: session.topic_id,
            user_id: session.user_id,
            guest_token: session.guest_token,
            created_at: session.created_at,
        }
    }
}

impl From<MongoMessage> for ChatMessage {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id.to_hex(),
            session_id: msg.session_id.to_hex(),
            role: msg.role,
            content: msg.content,
            ordinal: msg.ordinal.max(0) as u64,
            created_at: msg.created_at,
        }
    }
}

impl From<MongoProfile> for UserProfile {
    fn from(profile: MongoProfile) -> Self {
        Self {
            id: profile.id.to_hex(),
            session_id: profile.session_id.to_hex(),
            topic_id: profile.topic_id,
            profile: profile.profile,
            message_count: profile.message_count.max(0) as u64,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

impl From<MongoSynthesis> for PerspectiveSynthesis {
    fn from(synthesis: MongoSynthesis) -> Self {
        Self {
            id: synthesis.id.to_hex(),
            topic_id: synthesis.topic_id,
            commonalities: synthesis.commonalities,
            tension_fields: synthesis.tension_fields,
            profile_count: synthesis.profile_count.max(0) as u64,
            created_at: synthesis.created_at,
            updated_at: synthesis.updated_at,
        }
    }
}
