use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::stream,
    middleware::logging,
    routes::{artifacts, chat, guests, health, profiles, synthesis, transcribe},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Conversation
        .route("/topics/:slug/chat", post(chat::send_message))
        .route("/topics/:slug/chat/stream", post(stream::send_message_stream))
        .route("/topics/:slug/chat/history", get(chat::history))
        // Profiles
        .route("/topics/:slug/profile", get(profiles::get_profile))
        .route("/topics/:slug/profiles", get(profiles::list_profiles))
        .route("/sessions/:session_id/profile", post(profiles::regenerate_profile))
        // Synthesis
        .route(
            "/topics/:slug/synthesis",
            get(synthesis::synthesis_status).post(synthesis::request_synthesis),
        )
        // Catalog
        .route("/topics/:slug/artifacts", get(artifacts::list_artifacts))
        // Guests
        .route("/guests/:token", delete(guests::delete_guest))
        // Speech
        .route(
            "/transcribe",
            post(transcribe::transcribe)
                .layer(DefaultBodyLimit::max(transcribe::MAX_AUDIO_BYTES)),
        );

    Router::new()
        .merge(api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(300))) // covers streamed turns
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            // A single call: each `allow_origin` replaces the previous one
            let parsed_origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
