use agora_engine::{SynthesisOutcome, SynthesisStatus};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::topic_by_slug;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SynthesisQuery {
    #[serde(default)]
    pub force: bool,
}

/// Cached synthesis and its freshness; never generates
pub async fn synthesis_status(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<SynthesisStatus>> {
    let topic = topic_by_slug(&state, &slug).await?;
    Ok(Json(state.synthesis.status(&topic.id).await?))
}

pub async fn request_synthesis(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<SynthesisQuery>,
) -> ApiResult<Json<SynthesisOutcome>> {
    let topic = topic_by_slug(&state, &slug).await?;

    let outcome = if query.force {
        state.synthesis.regenerate(&topic.id).await?
    } else {
        state.synthesis.request(&topic.id).await?
    };
    Ok(Json(outcome))
}
