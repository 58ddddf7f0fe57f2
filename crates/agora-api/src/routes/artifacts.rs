use agora_engine::resolve_artifacts;
use agora_persist::Artifact;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::topic_by_slug;
use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ArtifactsQuery {
    /// Comma-separated ids as found in a content marker
    pub ids: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactsResponse {
    pub artifacts: Vec<Artifact>,
}

pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<ArtifactsQuery>,
) -> ApiResult<Json<ArtifactsResponse>> {
    let topic = topic_by_slug(&state, &slug).await?;

    let artifacts = match query.ids {
        Some(ids) => {
            let ids: Vec<String> = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            resolve_artifacts(state.catalog.as_ref(), &topic.id, &ids).await?
        }
        None => state.catalog.list_artifacts(&topic.id).await?,
    };

    Ok(Json(ArtifactsResponse { artifacts }))
}
