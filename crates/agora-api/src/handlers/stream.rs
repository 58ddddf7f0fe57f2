use agora_engine::{parse_reply, prompts::is_start_signal, EngineError};
use agora_types::TurnEvent;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    error::ApiResult,
    identity::Participant,
    routes::{chat::SendMessageRequest, topic_by_slug},
    state::AppState,
};

/// Send a message and stream the reply using Server-Sent Events
///
/// Emits `delta` events while the reply is generated, then exactly one
/// `done` or `error` event. The turn keeps running (and persists) if the
/// client disconnects.
pub async fn send_message_stream(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Participant(identity): Participant,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let topic = topic_by_slug(&state, &slug).await?;

    // Reject before the stream opens so the client gets a plain 400
    if !is_start_signal(&req.message) && req.message.trim().is_empty() {
        return Err(EngineError::EmptyMessage.into());
    }

    let event_receiver = state
        .orchestrator
        .spawn_turn(topic.id, identity, req.message);

    let sse_stream = ReceiverStream::new(event_receiver)
        .map(|event| Ok::<Event, Infallible>(to_sse_event(event)));

    Ok(Sse::new(sse_stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: TurnEvent) -> Event {
    let (name, data) = match event {
        TurnEvent::Delta { content } => ("delta", json!({ "content": content })),
        TurnEvent::Done {
            session_id,
            reply,
            message_count,
            messages_until_next_update,
            profile_update_dispatched,
        } => {
            let parsed = parse_reply(&reply);
            (
                "done",
                json!({
                    "sessionId": session_id,
                    "reply": reply,
                    "cleanText": parsed.clean_text,
                    "contentIds": parsed.content_ids,
                    "messageCount": message_count,
                    "messagesUntilNextUpdate": messages_until_next_update,
                    "profileUpdateDispatched": profile_update_dispatched,
                }),
            )
        }
        TurnEvent::Error { message } => ("error", json!({ "error": message })),
    };

    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| {
            tracing::error!("Failed to encode SSE event: {}", e);
            Event::default().event("error").data("encoding failed")
        })
}

