use agora_engine::ProfileStatus;
use agora_persist::UserProfile;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::topic_by_slug;
use crate::{
    error::{ApiError, ApiResult},
    identity::Participant,
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProfilesResponse {
    pub profiles: Vec<UserProfile>,
    pub count: usize,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Participant(identity): Participant,
) -> ApiResult<Json<ProfileStatus>> {
    let topic = topic_by_slug(&state, &slug).await?;
    let status = state.profiles.get_profile(&topic.id, &identity).await?;
    Ok(Json(status))
}

pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ListProfilesResponse>> {
    let topic = topic_by_slug(&state, &slug).await?;
    let profiles = state.profiles.list_profiles(&topic.id).await?;
    Ok(Json(ListProfilesResponse {
        count: profiles.len(),
        profiles,
    }))
}

/// Regenerate the profile of one of the caller's own sessions
pub async fn regenerate_profile(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Participant(identity): Participant,
) -> ApiResult<Json<UserProfile>> {
    // Someone else's session is reported as missing
    let owned = state
        .store
        .get_session(&session_id)
        .await?
        .filter(|session| session.belongs_to(&identity));
    if owned.is_none() {
        return Err(ApiError::SessionNotFound(session_id));
    }

    let profile = state.profiles.regenerate(&session_id).await?;
    Ok(Json(profile))
}
