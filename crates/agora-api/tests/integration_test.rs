use agora_api::{build_router, config::Config, state::AppState};
use agora_llm::mock::ScriptedClient;
use agora_persist::{Artifact, MemoryPersistenceClient, PersistenceClient, Topic};
use agora_types::{AttitudeProfile, CoreValue, ParticipantIdentity};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = false
    origins = []

    [storage]
    backend = "memory"
    database = "test"

    [llm]
    chat_model = "gpt-4o-mini"
    extraction_model = "gpt-4o"
    synthesis_model = "gpt-4o"
    transcription_model = "whisper-1"
    transcription_language = "de"
    response_language = "German"
    turn_timeout_secs = 5

    [profiles]
    worker_concurrency = 1

    [synthesis]
    max_attempts = 1
    strict_coherence = false

    [logging]
    level = "warn"
    format = "pretty"
"#;

struct TestApp {
    router: Router,
    llm: Arc<ScriptedClient>,
    store: Arc<MemoryPersistenceClient>,
    topic: Topic,
}

async fn test_app() -> TestApp {
    test_app_with(CONFIG).await
}

async fn test_app_with(config: &str) -> TestApp {
    let config: Config = toml::from_str(config).unwrap();
    let store = Arc::new(MemoryPersistenceClient::new());
    let topic = Topic::new("tempo-30", "Tempo 30");
    store.insert_topic(topic.clone()).await;
    store
        .insert_artifact(Artifact::new(
            "laermstudie",
            &topic.id,
            "https://example.org/laerm",
            "Lärmstudie",
        ))
        .await;

    let llm = Arc::new(ScriptedClient::new());
    let (state, _worker) = AppState::new(config, store.clone(), llm.clone());

    TestApp {
        router: build_router(Arc::new(state)),
        llm,
        store,
        topic,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

fn chat(uri: &str, guest: Option<&str>, message: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = guest {
        builder = builder.header("x-guest-token", token);
    }
    builder
        .body(Body::from(json!({ "message": message }).to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn attitude(title: &str) -> AttitudeProfile {
    AttitudeProfile {
        profile_title: title.to_string(),
        subtitle: None,
        role_context: "Anwohner".to_string(),
        overall_attitude: "skeptisch".to_string(),
        core_values: ["Ruhe", "Sicherheit", "Freiheit"]
            .into_iter()
            .map(|label| CoreValue { label: label.into(), description: None })
            .collect(),
        key_concerns: vec![],
        red_lines: vec![],
        counterarguments: vec![],
        conditions_for_change: vec![],
        characterization: "Abwägend.".to_string(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.send_json(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["storage"], "connected");
}

#[tokio::test]
async fn test_chat_requires_identity() {
    let app = test_app().await;
    let (status, body) = app.send_json(chat("/topics/tempo-30/chat", None, "Hallo")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_chat_unknown_topic() {
    let app = test_app().await;
    let (status, _) = app
        .send_json(chat("/topics/unbekannt/chat", Some("g1"), "Hallo"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_empty_message() {
    let app = test_app().await;
    let (status, _) = app.send_json(chat("/topics/tempo-30/chat", Some("g1"), "  ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_resolves_referenced_artifacts() {
    let app = test_app().await;
    app.llm.push_chat_reply("Dazu gibt es Daten. [[CONTENT:laermstudie,ghost]]");

    let (status, body) = app
        .send_json(chat("/topics/tempo-30/chat", Some("g1"), "Wie laut ist es?"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleanText"], "Dazu gibt es Daten.");
    assert_eq!(body["contentIds"], json!(["laermstudie", "ghost"]));
    assert_eq!(body["messageCount"], 1);
    assert_eq!(body["messagesUntilNextUpdate"], 5);
    assert_eq!(body["artifacts"].as_array().unwrap().len(), 1);
    assert_eq!(body["artifacts"][0]["title"], "Lärmstudie");
}

#[tokio::test]
async fn test_generation_failure_is_bad_gateway() {
    let app = test_app().await;
    app.llm.push_chat_error("provider down");

    let (status, body) = app
        .send_json(chat("/topics/tempo-30/chat", Some("g1"), "Hallo"))
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Generation failed");

    // The message itself was kept
    let (_, history) = app
        .send_json(get("/topics/tempo-30/chat/history?guestToken=g1"))
        .await;
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_history_via_query_token() {
    let app = test_app().await;
    app.send_json(chat("/topics/tempo-30/chat", Some("g1"), "START_SESSION")).await;
    app.send_json(chat("/topics/tempo-30/chat", Some("g1"), "Ich fahre Rad.")).await;

    let (status, body) = app
        .send_json(get("/topics/tempo-30/chat/history?guestToken=g1"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Ich fahre Rad.");

    let (_, other) = app
        .send_json(get("/topics/tempo-30/chat/history?guestToken=someone-else"))
        .await;
    assert!(other["sessionId"].is_null());
    assert!(other["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_emits_deltas_then_done() {
    let app = test_app().await;
    app.llm.push_chat_reply("Eine kurze Antwort");

    let (status, body) = app
        .send(chat("/topics/tempo-30/chat/stream", Some("g-stream"), "Hallo"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("event: delta"));
    assert!(body.contains("event: done"));
    assert!(!body.contains("event: error"));
    assert!(body.contains("\"messageCount\":1"));
}

#[tokio::test]
async fn test_stream_rejects_empty_message() {
    let app = test_app().await;
    let (status, _) = app
        .send(chat("/topics/tempo-30/chat/stream", Some("g1"), ""))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_status_for_new_participant() {
    let app = test_app().await;
    let request = Request::builder()
        .uri("/topics/tempo-30/profile")
        .header("x-user-id", "u-1")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["profile"].is_null());
    assert_eq!(body["messageCount"], 0);
    assert_eq!(body["messagesUntilNextUpdate"], 6);
}

#[tokio::test]
async fn test_regenerate_foreign_session_is_not_found() {
    let app = test_app().await;
    let session = app
        .store
        .get_or_create_session(&app.topic.id, &ParticipantIdentity::guest("owner"))
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri(format!("/sessions/{}/profile", session.id))
        .header("x-guest-token", "intruder")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send_json(request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.llm.structured_requests().is_empty());
}

#[tokio::test]
async fn test_synthesis_lifecycle() {
    let app = test_app().await;

    let (status, body) = app.send_json(get("/topics/tempo-30/synthesis")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["synthesis"].is_null());
    assert_eq!(body["needsGeneration"], true);

    let post = || {
        Request::builder()
            .method("POST")
            .uri("/topics/tempo-30/synthesis")
            .body(Body::empty())
            .unwrap()
    };
    let (_, body) = app.send_json(post()).await;
    assert_eq!(body["status"], "not_enough_data");
    assert_eq!(body["message"], "Mindestens 2 Perspektiven nötig für Vergleich");

    let mut ids = Vec::new();
    for guest in ["a", "b"] {
        let session = app
            .store
            .get_or_create_session(&app.topic.id, &ParticipantIdentity::guest(guest))
            .await
            .unwrap();
        let profile = app
            .store
            .upsert_profile(&session.id, &app.topic.id, attitude(guest), 6)
            .await
            .unwrap();
        ids.push(profile.id);
    }
    app.llm.push_object(json!({
        "commonalities": [{ "text": "Sicherheit zählt", "profileIds": [] }],
        "tensionFields": [{
            "leftLabel": "Tempo",
            "rightLabel": "Ruhe",
            "clusters": [
                { "position": 0.5, "profileIds": [ids[0], ids[1]], "summary": "Gemischte Haltung" }
            ]
        }]
    }));

    let (status, body) = app.send_json(post()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["generated"], true);
    assert_eq!(body["synthesis"]["profileCount"], 2);

    let (_, body) = app.send_json(get("/topics/tempo-30/synthesis")).await;
    assert_eq!(body["isStale"], false);
    assert_eq!(body["needsGeneration"], false);

    let (_, body) = app.send_json(get("/topics/tempo-30/profiles")).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_invalid_synthesis_is_bad_gateway() {
    let app = test_app().await;
    for guest in ["a", "b"] {
        let session = app
            .store
            .get_or_create_session(&app.topic.id, &ParticipantIdentity::guest(guest))
            .await
            .unwrap();
        app.store
            .upsert_profile(&session.id, &app.topic.id, attitude(guest), 6)
            .await
            .unwrap();
    }
    app.llm.push_object(json!({
        "commonalities": [],
        "tensionFields": [{
            "leftLabel": "Tempo",
            "rightLabel": "Ruhe",
            "clusters": [{ "position": 0.5, "profileIds": ["ghost"], "summary": "Unklar" }]
        }]
    }));

    let request = Request::builder()
        .method("POST")
        .uri("/topics/tempo-30/synthesis?force=true")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send_json(request).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_artifacts_listing_and_resolution() {
    let app = test_app().await;

    let (_, all) = app.send_json(get("/topics/tempo-30/artifacts")).await;
    assert_eq!(all["artifacts"].as_array().unwrap().len(), 1);

    let (_, resolved) = app
        .send_json(get("/topics/tempo-30/artifacts?ids=ghost,laermstudie"))
        .await;
    let artifacts = resolved["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0]["id"], "laermstudie");
}

#[tokio::test]
async fn test_delete_guest() {
    let app = test_app().await;
    app.send_json(chat("/topics/tempo-30/chat", Some("gone"), "Hallo")).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/guests/gone")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);

    let session = app
        .store
        .find_session(&app.topic.id, &ParticipantIdentity::guest("gone"))
        .await
        .unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_transcribe() {
    let app = test_app().await;
    app.llm.push_transcript("  Ich bin dafür. ");

    let request = Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header("content-type", "audio/webm;codecs=opus")
        .body(Body::from(vec![1u8, 2, 3, 4]))
        .unwrap();
    let (status, body) = app.send_json(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Ich bin dafür.");

    let empty = Request::builder()
        .method("POST")
        .uri("/transcribe")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send_json(empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_allows_every_configured_origin() {
    let config = CONFIG.replace("enabled = false", "enabled = true").replace(
        "origins = []",
        r#"origins = ["http://a.example", "http://b.example"]"#,
    );
    let app = test_app_with(&config).await;

    for origin in ["http://a.example", "http://b.example"] {
        let request = Request::builder()
            .uri("/health")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            origin
        );
    }

    let request = Request::builder()
        .uri("/health")
        .header("origin", "http://c.example")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().get("access-control-allow-origin").is_none());
}
