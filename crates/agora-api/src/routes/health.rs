use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the status of the API and whether storage is reachable
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let storage_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Storage ping failed: {}", e);
            false
        }
    };
    services.insert(
        "storage".to_string(),
        if storage_ok { "connected" } else { "disconnected" }.to_string(),
    );

    Json(HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
