mod common;

use agora_engine::synthesis::NOT_ENOUGH_DATA_MESSAGE;
use agora_engine::{EngineConfig, EngineError, SynthesisOutcome};
use agora_llm::mock::ScriptedClient;
use agora_persist::PersistenceClient;
use agora_types::{ParticipantIdentity, SchemaViolation};
use common::{profile_json, synthesis_json, Harness};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

#[tokio::test]
async fn test_extraction_replaces_profile_in_place() {
    let harness = Harness::new().await;
    let guest = ParticipantIdentity::guest("g-upsert");
    let session = harness
        .store
        .get_or_create_session(&harness.topic.id, &guest)
        .await
        .unwrap();
    harness
        .store
        .append_message(&session.id, agora_persist::MessageRole::User, "Zu laut hier")
        .await
        .unwrap();

    harness.llm.push_object(profile_json("Erster Entwurf"));
    harness.llm.push_object(profile_json("Zweiter Entwurf"));

    let extractor = harness.extractor();
    let first = extractor.extract(&session.id).await.unwrap();
    let second = extractor.extract(&session.id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.profile.profile_title, "Zweiter Entwurf");
    assert_eq!(second.message_count, 1);
    assert_eq!(harness.store.count_profiles(&harness.topic.id).await.unwrap(), 1);

    let request = &harness.llm.structured_requests()[0];
    assert_eq!(request.schema_name, "attitude_profile");
    assert!(request.prompt.contains("NUTZER: Zu laut hier"));
}

#[tokio::test]
async fn test_invalid_profile_is_not_stored() {
    let harness = Harness::new().await;
    let session = harness
        .store
        .get_or_create_session(&harness.topic.id, &ParticipantIdentity::guest("g-invalid"))
        .await
        .unwrap();

    let mut object = profile_json("Zu wenig Werte");
    object["coreValues"] = json!([{ "label": "Nur einer", "description": null }]);
    harness.llm.push_object(object);

    let err = harness.extractor().extract(&session.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Schema(SchemaViolation::Cardinality { field: "coreValues", .. })
    ));
    assert!(harness.store.get_profile_by_session(&session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_regenerate_surfaces_errors() {
    let harness = Harness::new().await;
    let err = harness.profiles().regenerate("missing").await.unwrap_err();
    assert!(matches!(err, EngineError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_not_enough_profiles() {
    let harness = Harness::new().await;
    harness.seed_profile("solo", "Allein").await;

    let outcome = harness.synthesis().request(&harness.topic.id).await.unwrap();
    assert_eq!(
        outcome,
        SynthesisOutcome::NotEnoughData {
            profile_count: 1,
            message: NOT_ENOUGH_DATA_MESSAGE.to_string(),
        }
    );
    assert!(harness.llm.structured_requests().is_empty());
}

#[tokio::test]
async fn test_two_guests_synthesis_and_staleness() {
    let harness = Harness::new().await;
    let a = harness.seed_profile("guest-a", "Die Vorsichtige").await;
    let b = harness.seed_profile("guest-b", "Der Pragmatiker").await;
    harness.llm.push_object(synthesis_json(&[&a.id, &b.id]));

    let engine = harness.synthesis();
    let SynthesisOutcome::Ready { synthesis, generated } =
        engine.request(&harness.topic.id).await.unwrap()
    else {
        panic!("expected a synthesis");
    };
    assert!(generated);
    assert_eq!(synthesis.profile_count, 2);

    let mut covered: Vec<&String> = synthesis.tension_fields[0]
        .clusters
        .iter()
        .flat_map(|c| &c.profile_ids)
        .collect();
    covered.sort();
    let mut expected = vec![&a.id, &b.id];
    expected.sort();
    assert_eq!(covered, expected);

    // Unattributed commonalities cover the whole population
    assert_eq!(synthesis.commonalities[0].profile_ids.len(), 2);

    let status = engine.status(&harness.topic.id).await.unwrap();
    assert!(!status.is_stale);
    assert!(!status.needs_generation);

    // Fresh cache is served without another generation
    let cached = engine.request(&harness.topic.id).await.unwrap();
    assert!(matches!(cached, SynthesisOutcome::Ready { generated: false, .. }));
    assert_eq!(harness.llm.structured_requests().len(), 1);

    harness.seed_profile("guest-c", "Die Skeptikerin").await;
    let status = engine.status(&harness.topic.id).await.unwrap();
    assert_eq!(status.profile_count, 3);
    assert!(status.is_stale);
    assert!(status.needs_generation);
}

#[tokio::test]
async fn test_status_without_synthesis() {
    let harness = Harness::new().await;
    let status = harness.synthesis().status(&harness.topic.id).await.unwrap();
    assert!(status.synthesis.is_none());
    assert!(!status.is_stale);
    assert!(status.needs_generation);
}

#[tokio::test]
async fn test_partition_violation_is_retried() {
    let harness = Harness::new().await;
    let a = harness.seed_profile("guest-a", "A").await;
    let b = harness.seed_profile("guest-b", "B").await;

    harness.llm.push_object(synthesis_json(&[&a.id]));
    harness.llm.push_object(synthesis_json(&[&a.id, &b.id]));

    let outcome = harness.synthesis().regenerate(&harness.topic.id).await.unwrap();
    assert!(matches!(outcome, SynthesisOutcome::Ready { generated: true, .. }));

    let requests = harness.llm.structured_requests();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].prompt.contains("ungültig"));
    assert!(requests[1].prompt.contains("ungültig"));
}

#[tokio::test]
async fn test_gives_up_after_attempts() {
    let harness = Harness::new().await;
    let a = harness.seed_profile("guest-a", "A").await;
    harness.seed_profile("guest-b", "B").await;

    harness.llm.push_object(synthesis_json(&[&a.id]));
    harness.llm.push_object(synthesis_json(&[&a.id, &a.id]));

    let err = harness.synthesis().regenerate(&harness.topic.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Schema(_)));
    assert!(harness.store.get_synthesis(&harness.topic.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_out_of_range_position_rejected() {
    let config = EngineConfig::new().with_synthesis_attempts(1);
    let harness = Harness::with(config, ScriptedClient::new()).await;
    let a = harness.seed_profile("guest-a", "A").await;
    let b = harness.seed_profile("guest-b", "B").await;

    let mut object = synthesis_json(&[&a.id, &b.id]);
    object["tensionFields"][0]["clusters"][1]["position"] = json!(1.4);
    harness.llm.push_object(object);

    let err = harness.synthesis().regenerate(&harness.topic.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Schema(SchemaViolation::PositionOutOfRange { .. })
    ));
}

#[tokio::test]
async fn test_incoherent_cluster_only_rejected_when_strict() {
    let incoherent = |a: &str, b: &str| {
        let mut object = synthesis_json(&[a, b]);
        object["tensionFields"][0]["clusters"][0]["position"] = json!(0.9);
        object
    };

    let lenient = Harness::new().await;
    let a = lenient.seed_profile("guest-a", "A").await;
    let b = lenient.seed_profile("guest-b", "B").await;
    lenient.llm.push_object(incoherent(&a.id, &b.id));
    let outcome = lenient.synthesis().regenerate(&lenient.topic.id).await.unwrap();
    assert!(matches!(outcome, SynthesisOutcome::Ready { .. }));

    let config = EngineConfig::new()
        .with_strict_coherence(true)
        .with_synthesis_attempts(1);
    let strict = Harness::with(config, ScriptedClient::new()).await;
    let a = strict.seed_profile("guest-a", "A").await;
    let b = strict.seed_profile("guest-b", "B").await;
    strict.llm.push_object(incoherent(&a.id, &b.id));
    let err = strict.synthesis().regenerate(&strict.topic.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Schema(SchemaViolation::Incoherent { .. })));
}

#[tokio::test]
async fn test_delete_guest_removes_profile_from_population() {
    let harness = Harness::new().await;
    harness.seed_profile("leaving", "Weg").await;
    harness.seed_profile("staying", "Da").await;

    let deleted = harness.profiles().delete_guest("leaving").await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(harness.profiles().list_profiles(&harness.topic.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_guest_deleted_during_extraction_leaves_no_profile() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with(
        EngineConfig::new(),
        ScriptedClient::new().with_object_gate(Arc::clone(&gate)),
    )
    .await;
    let session = harness
        .store
        .get_or_create_session(&harness.topic.id, &ParticipantIdentity::guest("g-leaving"))
        .await
        .unwrap();
    harness
        .store
        .append_message(&session.id, agora_persist::MessageRole::User, "Ich bin dagegen")
        .await
        .unwrap();
    harness.llm.push_object(profile_json("Zu spät"));

    let extractor = harness.extractor();
    let session_id = session.id.clone();
    let pending = tokio::spawn(async move { extractor.extract(&session_id).await });

    // Wait until the extraction is parked on the model call
    while harness.llm.structured_requests().is_empty() {
        tokio::task::yield_now().await;
    }
    assert_eq!(harness.profiles().delete_guest("g-leaving").await.unwrap(), 1);
    gate.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, EngineError::SessionNotFound(ref id) if id == &session.id));
    assert_eq!(harness.store.count_profiles(&harness.topic.id).await.unwrap(), 0);
    assert!(harness.store.get_profile_by_session(&session.id).await.unwrap().is_none());
}
