use agora_engine::EngineError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing participant identity")]
    Unauthorized,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Persistence error: {0}")]
    Persist(#[from] agora_persist::PersistError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::TopicNotFound(_) | ApiError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Engine(ref e) => engine_status(e),
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

fn engine_status(error: &EngineError) -> (StatusCode, String) {
    match error {
        EngineError::TopicNotFound(_) | EngineError::SessionNotFound(_) => {
            (StatusCode::NOT_FOUND, error.to_string())
        }
        EngineError::EmptyMessage => (StatusCode::BAD_REQUEST, error.to_string()),
        EngineError::Timeout(_) => {
            tracing::warn!("{}", error);
            (StatusCode::GATEWAY_TIMEOUT, error.to_string())
        }
        EngineError::Generation(_) | EngineError::InvalidOutput(_) | EngineError::Schema(_) => {
            tracing::error!("Generation error: {}", error);
            (StatusCode::BAD_GATEWAY, "Generation failed".to_string())
        }
        EngineError::Persist(e) => {
            tracing::error!("Persistence error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
