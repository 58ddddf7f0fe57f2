use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Upper bound for one recording
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Speech-to-text over a raw audio body
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<TranscriptionResponse>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Audio body is empty".to_string()));
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());
    let filename = mime_type.as_deref().and_then(filename_for);

    let text = state
        .transcription
        .transcribe(body.to_vec(), filename, mime_type.as_deref())
        .await?;
    Ok(Json(TranscriptionResponse { text }))
}

/// The provider infers the format from the file extension
fn filename_for(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "audio/webm" => Some("recording.webm"),
        "audio/ogg" => Some("recording.ogg"),
        "audio/mpeg" | "audio/mp3" => Some("recording.mp3"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("recording.m4a"),
        "audio/wav" | "audio/x-wav" | "audio/wave" => Some("recording.wav"),
        _ => None,
    }
}
