pub mod artifacts;
pub mod chat;
pub mod guests;
pub mod health;
pub mod profiles;
pub mod synthesis;
pub mod transcribe;

use agora_persist::Topic;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Topics are addressed by slug on the wire and by id everywhere else
pub(crate) async fn topic_by_slug(state: &AppState, slug: &str) -> ApiResult<Topic> {
    state
        .catalog
        .get_topic_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::TopicNotFound(slug.to_string()))
}
