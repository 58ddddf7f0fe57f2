use agora_engine::{
    Orchestrator, ProfileExtractor, ProfileJobQueue, ProfileService, SynthesisEngine,
    TranscriptionService,
};
use agora_llm::{ChatClient, StructuredClient, Transcriber};
use agora_persist::{PersistenceClient, TopicCatalog};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The engine services are cheap handles over the same storage and model
/// client; they are built once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PersistenceClient>,
    pub catalog: Arc<dyn TopicCatalog>,
    pub orchestrator: Orchestrator,
    pub profiles: ProfileService,
    pub synthesis: SynthesisEngine,
    pub transcription: TranscriptionService,
}

impl AppState {
    /// Wire the engine over one storage backend and one model client.
    ///
    /// Starts the background profile worker; the returned handle finishes
    /// once the state (and with it the job queue) is dropped.
    pub fn new<S, L>(config: Config, storage: Arc<S>, llm: Arc<L>) -> (Self, JoinHandle<()>)
    where
        S: PersistenceClient + TopicCatalog + 'static,
        L: ChatClient + StructuredClient + Transcriber + 'static,
    {
        let engine_config = Arc::new(config.engine_config());
        let store: Arc<dyn PersistenceClient> = storage.clone();
        let catalog: Arc<dyn TopicCatalog> = storage;
        let chat: Arc<dyn ChatClient> = llm.clone();
        let structured: Arc<dyn StructuredClient> = llm.clone();
        let transcriber: Arc<dyn Transcriber> = llm;

        let extractor = ProfileExtractor::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::clone(&structured),
            Arc::clone(&engine_config),
        );
        let (queue, worker) =
            ProfileJobQueue::start(extractor.clone(), config.profiles.worker_concurrency);

        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            chat,
            Arc::new(queue),
            Arc::clone(&engine_config),
        );
        let profiles = ProfileService::new(Arc::clone(&store), extractor);
        let synthesis =
            SynthesisEngine::new(Arc::clone(&store), structured, Arc::clone(&engine_config));
        let transcription = TranscriptionService::new(transcriber, engine_config);

        let state = Self {
            config: Arc::new(config),
            store,
            catalog,
            orchestrator,
            profiles,
            synthesis,
            transcription,
        };
        (state, worker)
    }
}
