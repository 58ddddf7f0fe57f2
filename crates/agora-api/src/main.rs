use agora_api::{
    build_router,
    catalog::load_catalog,
    config::{Config, StorageBackend},
    state::AppState,
};
use agora_llm::{OpenAIClient, OpenAIConfig};
use agora_persist::{MemoryPersistenceClient, MongoPersistenceClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Agora API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!("Initializing LLM client");
    let mut openai_config = OpenAIConfig::new(&config.openai_api_key);
    if let Some(base_url) = &config.llm.base_url {
        openai_config = openai_config.with_base_url(base_url);
    }
    let llm = Arc::new(OpenAIClient::from_config(&openai_config)?);

    let (state, _profile_worker) = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage");
            let store = Arc::new(MemoryPersistenceClient::new());
            if let Some(path) = &config.storage.catalog_path {
                let topics = load_catalog(path, &store).await?;
                tracing::info!("Loaded {} topics from {}", topics, path);
            }
            AppState::new(config.clone(), store, llm)
        }
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let store = Arc::new(
                MongoPersistenceClient::connect(&config.mongodb_uri, &config.storage.database)
                    .await?,
            );
            tracing::info!("MongoDB connected");
            AppState::new(config.clone(), store, llm)
        }
    };

    let app = build_router(Arc::new(state));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
