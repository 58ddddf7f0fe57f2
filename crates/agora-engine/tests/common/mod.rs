#![allow(dead_code)]

use agora_engine::{
    EngineConfig, Orchestrator, ProfileDispatch, ProfileExtractor, ProfileJob, ProfileService,
    SynthesisEngine,
};
use agora_llm::mock::ScriptedClient;
use agora_persist::{
    Artifact, MemoryPersistenceClient, PersistenceClient, Topic, TopicCatalog, UserProfile,
};
use agora_types::{AttitudeProfile, CoreValue, KeyConcern, ParticipantIdentity};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct RecordingDispatch {
    jobs: Mutex<Vec<ProfileJob>>,
}

impl RecordingDispatch {
    pub fn jobs(&self) -> Vec<ProfileJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl ProfileDispatch for RecordingDispatch {
    fn dispatch(&self, job: ProfileJob) -> bool {
        self.jobs.lock().unwrap().push(job);
        true
    }
}

pub struct Harness {
    pub store: Arc<MemoryPersistenceClient>,
    pub llm: Arc<ScriptedClient>,
    pub dispatch: Arc<RecordingDispatch>,
    pub config: Arc<EngineConfig>,
    pub topic: Topic,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(EngineConfig::new(), ScriptedClient::new()).await
    }

    pub async fn with(config: EngineConfig, llm: ScriptedClient) -> Self {
        let store = Arc::new(MemoryPersistenceClient::new());
        let topic = Topic::new("tempo-30", "Tempo 30 in der Innenstadt")
            .with_description("Soll in der ganzen Innenstadt Tempo 30 gelten?");
        store.insert_topic(topic.clone()).await;
        store
            .insert_artifact(
                Artifact::new("studie-laerm", &topic.id, "https://example.org/laerm", "Lärmstudie")
                    .with_tags(["studie"]),
            )
            .await;

        Self {
            store,
            llm: Arc::new(llm),
            dispatch: Arc::new(RecordingDispatch::default()),
            config: Arc::new(config),
            topic,
        }
    }

    pub fn persistence(&self) -> Arc<dyn PersistenceClient> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Arc<dyn TopicCatalog> {
        self.store.clone()
    }

    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator_with(self.dispatch.clone())
    }

    pub fn orchestrator_with(&self, dispatcher: Arc<dyn ProfileDispatch>) -> Orchestrator {
        Orchestrator::new(
            self.persistence(),
            self.catalog(),
            self.llm.clone(),
            dispatcher,
            Arc::clone(&self.config),
        )
    }

    pub fn extractor(&self) -> ProfileExtractor {
        ProfileExtractor::new(
            self.persistence(),
            self.catalog(),
            self.llm.clone(),
            Arc::clone(&self.config),
        )
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.persistence(), self.extractor())
    }

    pub fn synthesis(&self) -> SynthesisEngine {
        SynthesisEngine::new(self.persistence(), self.llm.clone(), Arc::clone(&self.config))
    }

    /// Store a profile for a fresh guest and return it
    pub async fn seed_profile(&self, guest: &str, title: &str) -> UserProfile {
        let session = self
            .store
            .get_or_create_session(&self.topic.id, &ParticipantIdentity::guest(guest))
            .await
            .unwrap();
        self.store
            .upsert_profile(&session.id, &self.topic.id, attitude(title), 6)
            .await
            .unwrap()
    }
}

pub fn attitude(title: &str) -> AttitudeProfile {
    AttitudeProfile {
        profile_title: title.to_string(),
        subtitle: None,
        role_context: "Pendlerin mit Fahrrad".to_string(),
        overall_attitude: "vorsichtig zustimmend".to_string(),
        core_values: ["Sicherheit", "Ruhe", "Erreichbarkeit"]
            .into_iter()
            .map(|label| CoreValue { label: label.into(), description: None })
            .collect(),
        key_concerns: vec![KeyConcern { text: "Lieferverkehr".into(), qualification: None }],
        red_lines: vec![],
        counterarguments: vec![],
        conditions_for_change: vec![],
        characterization: "Wägt Sicherheit gegen Erreichbarkeit ab.".to_string(),
    }
}

pub fn profile_json(title: &str) -> Value {
    json!({
        "profileTitle": title,
        "subtitle": null,
        "roleContext": "Anwohner an einer Hauptstraße",
        "overallAttitude": "befürwortend",
        "coreValues": [
            { "label": "Gesundheit", "description": "Weniger Lärm" },
            { "label": "Sicherheit", "description": null },
            { "label": "Gemeinschaft", "description": null }
        ],
        "keyConcerns": [{ "text": "Lärm in der Nacht", "qualification": null }],
        "redLines": [{ "text": "Keine Ausnahmen für Lkw", "scope": null }],
        "counterarguments": [{ "argument": "Längere Fahrzeiten", "whyUnderstood": "Pendeln ist anstrengend" }],
        "conditionsForChange": [],
        "characterization": "Setzt auf Lebensqualität im Quartier."
    })
}

/// Synthesis object with one tension field holding each id in its own cluster
pub fn synthesis_json(ids: &[&str]) -> Value {
    let clusters: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            json!({
                "position": if i == 0 { 0.1 } else { 0.9 },
                "profileIds": [id],
                "summary": if i == 0 { "Setzen auf Freiwilligkeit" } else { "Fordern Zwang" }
            })
        })
        .collect();

    json!({
        "commonalities": [{ "text": "Sicherheit von Kindern ist allen wichtig", "profileIds": [] }],
        "tensionFields": [{
            "leftLabel": "Freiwilligkeit",
            "rightLabel": "Zwang",
            "clusters": clusters
        }]
    })
}
