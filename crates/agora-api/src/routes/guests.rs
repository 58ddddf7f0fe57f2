use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct DeleteGuestResponse {
    pub deleted: u64,
}

/// Delete every session created under a guest token, with messages and profiles
pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Json<DeleteGuestResponse>> {
    let deleted = state.profiles.delete_guest(&token).await?;
    Ok(Json(DeleteGuestResponse { deleted }))
}
