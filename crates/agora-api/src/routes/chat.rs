use agora_engine::{resolve_artifacts, ChatHistory, TurnOutcome};
use agora_persist::Artifact;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::topic_by_slug;
use crate::{error::ApiResult, identity::Participant, state::AppState};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(flatten)]
    pub turn: TurnOutcome,
    /// Artifacts referenced by the reply's content markers
    pub artifacts: Vec<Artifact>,
}

/// Send a message and return the complete reply
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Participant(identity): Participant,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let topic = topic_by_slug(&state, &slug).await?;

    let turn = state
        .orchestrator
        .send_message(&topic.id, &identity, &req.message)
        .await?;
    let artifacts = resolve_artifacts(state.catalog.as_ref(), &topic.id, &turn.content_ids).await?;

    Ok(Json(SendMessageResponse { turn, artifacts }))
}

/// Messages of the participant's session in creation order
pub async fn history(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Participant(identity): Participant,
) -> ApiResult<Json<ChatHistory>> {
    let topic = topic_by_slug(&state, &slug).await?;
    let history = state.profiles.history(&topic.id, &identity).await?;
    Ok(Json(history))
}
