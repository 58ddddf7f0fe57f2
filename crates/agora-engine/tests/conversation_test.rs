mod common;

use agora_engine::prompts::START_SIGNAL;
use agora_engine::{ConversationPhase, EngineConfig, EngineError, ProfileJobQueue};
use agora_llm::mock::{ScriptedClient, DEFAULT_CHAT_REPLY};
use agora_persist::{MessageRole, PersistenceClient};
use agora_types::{ParticipantIdentity, TurnEvent};
use common::{profile_json, Harness};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_intro_is_generated_once() {
    let harness = Harness::new().await;
    harness.llm.push_chat_reply("Willkommen! Was verbindest du mit Tempo 30?");
    let orchestrator = harness.orchestrator();
    let guest = ParticipantIdentity::guest("g-intro");

    let intro = orchestrator
        .send_message(&harness.topic.id, &guest, START_SIGNAL)
        .await
        .unwrap();
    assert_eq!(intro.reply, "Willkommen! Was verbindest du mit Tempo 30?");
    assert_eq!(intro.message_count, 0);
    assert_eq!(intro.messages_until_next_update, 6);
    assert!(!intro.profile_update_dispatched);

    let again = orchestrator
        .send_message(&harness.topic.id, &guest, START_SIGNAL)
        .await
        .unwrap();
    assert_eq!(again.reply, intro.reply);
    assert_eq!(harness.llm.chat_requests().len(), 1);

    let history = harness.profiles().history(&harness.topic.id, &guest).await.unwrap();
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].role, MessageRole::Assistant);
    assert_eq!(
        orchestrator.phase(&harness.topic.id, &guest).await.unwrap(),
        ConversationPhase::Intro
    );
}

#[tokio::test]
async fn test_instructions_follow_phase() {
    let harness = Harness::new().await;
    let orchestrator = harness.orchestrator();
    let guest = ParticipantIdentity::guest("g-phase");

    orchestrator.send_message(&harness.topic.id, &guest, START_SIGNAL).await.unwrap();
    orchestrator.send_message(&harness.topic.id, &guest, "Ich finde es gut.").await.unwrap();

    let requests = harness.llm.chat_requests();
    assert_eq!(requests.len(), 2);
    let intro_system = requests[0].messages[0].content().to_text();
    let turn_system = requests[1].messages[0].content().to_text();
    assert!(intro_system.contains("exactly ONE question"));
    assert!(turn_system.contains("exactly three parts"));
    assert!(turn_system.contains("studie-laerm"));
}

#[tokio::test]
async fn test_profile_dispatched_on_sixth_message_only() {
    let harness = Harness::new().await;
    let orchestrator = harness.orchestrator();
    let guest = ParticipantIdentity::guest("g-six");

    let mut countdown = Vec::new();
    for i in 1..=8 {
        let outcome = orchestrator
            .send_message(&harness.topic.id, &guest, &format!("Beitrag {}", i))
            .await
            .unwrap();
        assert_eq!(outcome.message_count, i);
        assert_eq!(outcome.profile_update_dispatched, i == 6);
        countdown.push(outcome.messages_until_next_update);
    }

    assert_eq!(countdown, vec![5, 4, 3, 2, 1, 3, 2, 1]);
    let jobs = harness.dispatch.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].message_count, 6);
}

#[tokio::test]
async fn test_failed_generation_keeps_participant_message() {
    let harness = Harness::new().await;
    harness.llm.push_chat_error("upstream unavailable");
    let orchestrator = harness.orchestrator();
    let guest = ParticipantIdentity::guest("g-fail");

    let err = orchestrator
        .send_message(&harness.topic.id, &guest, "Mein Punkt")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Generation(_)));

    let history = harness.profiles().history(&harness.topic.id, &guest).await.unwrap();
    assert_eq!(history.messages.len(), 1);
    assert_eq!(history.messages[0].content, "Mein Punkt");

    // Retrying produces the reply without duplicating the earlier message
    let outcome = orchestrator
        .send_message(&harness.topic.id, &guest, "Nochmal")
        .await
        .unwrap();
    assert_eq!(outcome.message_count, 2);
}

#[tokio::test]
async fn test_turn_times_out() {
    let config = EngineConfig::new().with_turn_timeout(Duration::from_millis(50));
    let llm = ScriptedClient::new().with_chat_delay(Duration::from_millis(500));
    let harness = Harness::with(config, llm).await;
    let guest = ParticipantIdentity::guest("g-slow");

    let err = harness
        .orchestrator()
        .send_message(&harness.topic.id, &guest, "Hallo?")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)));

    let session = harness.store.find_session(&harness.topic.id, &guest).await.unwrap().unwrap();
    let messages = harness.store.get_messages(&session.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_rejects_empty_message_and_unknown_topic() {
    let harness = Harness::new().await;
    let orchestrator = harness.orchestrator();
    let guest = ParticipantIdentity::guest("g-bad");

    let empty = orchestrator.send_message(&harness.topic.id, &guest, "   ").await.unwrap_err();
    assert!(matches!(empty, EngineError::EmptyMessage));

    let missing = orchestrator.send_message("nope", &guest, "Hallo").await.unwrap_err();
    assert!(matches!(missing, EngineError::TopicNotFound(_)));
    assert!(harness.llm.chat_requests().is_empty());
}

#[tokio::test]
async fn test_spawned_turn_streams_then_finishes() {
    let harness = Harness::new().await;
    harness.llm.push_chat_reply("Ein Gedanke dazu: [[CONTENT:studie-laerm]]");
    let guest = ParticipantIdentity::guest("g-stream");

    let mut rx = harness.orchestrator().spawn_turn(
        harness.topic.id.clone(),
        guest,
        "Was sagt die Forschung?".to_string(),
    );

    let mut streamed = String::new();
    let mut done = None;
    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::Delta { content } => streamed.push_str(&content),
            TurnEvent::Done { reply, message_count, .. } => done = Some((reply, message_count)),
            TurnEvent::Error { message } => panic!("unexpected error: {}", message),
        }
    }

    let (reply, message_count) = done.expect("turn should finish with Done");
    assert_eq!(streamed, reply);
    assert_eq!(message_count, 1);
    assert!(reply.ends_with("[[CONTENT:studie-laerm]]"));
}

#[tokio::test]
async fn test_spawned_turn_reports_error() {
    let harness = Harness::new().await;
    let guest = ParticipantIdentity::guest("g-err");

    let mut rx = harness
        .orchestrator()
        .spawn_turn("missing".to_string(), guest, "Hallo".to_string());

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert!(matches!(last, Some(TurnEvent::Error { .. })));
}

#[tokio::test]
async fn test_queue_extracts_profile_in_background() {
    let harness = Harness::new().await;
    harness.llm.push_object(profile_json("Die Ruhesuchende"));
    let (queue, _worker) = ProfileJobQueue::start(harness.extractor(), 2);
    let orchestrator = harness.orchestrator_with(Arc::new(queue));
    let guest = ParticipantIdentity::guest("g-bg");

    for i in 1..=6 {
        orchestrator
            .send_message(&harness.topic.id, &guest, &format!("Gedanke {}", i))
            .await
            .unwrap();
    }

    let profiles = harness.profiles();
    let mut status = profiles.get_profile(&harness.topic.id, &guest).await.unwrap();
    for _ in 0..50 {
        if status.profile.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = profiles.get_profile(&harness.topic.id, &guest).await.unwrap();
    }

    let profile = status.profile.expect("profile should be generated");
    assert_eq!(profile.profile.profile_title, "Die Ruhesuchende");
    assert_eq!(profile.message_count, 6);
    assert_eq!(status.message_count, 6);
    assert_eq!(status.messages_until_next_update, 3);
}

#[tokio::test]
async fn test_unknown_participant_has_empty_status() {
    let harness = Harness::new().await;
    let status = harness
        .profiles()
        .get_profile(&harness.topic.id, &ParticipantIdentity::user("nobody"))
        .await
        .unwrap();
    assert!(status.profile.is_none());
    assert_eq!(status.message_count, 0);
    assert_eq!(status.messages_until_next_update, 6);
}

#[tokio::test]
async fn test_default_reply_used_when_unscripted() {
    let harness = Harness::new().await;
    let outcome = harness
        .orchestrator()
        .send_message(&harness.topic.id, &ParticipantIdentity::user("u-1"), "Hallo")
        .await
        .unwrap();
    assert_eq!(outcome.reply, DEFAULT_CHAT_REPLY);
    assert!(outcome.content_ids.is_empty());
}
