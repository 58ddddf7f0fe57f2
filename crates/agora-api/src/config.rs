use agora_engine::EngineConfig;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub llm: LlmConfig,
    pub profiles: ProfilesConfig,
    pub synthesis: SynthesisConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database: String,
    #[serde(default)]
    pub catalog_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub chat_model: String,
    pub extraction_model: String,
    pub synthesis_model: String,
    pub transcription_model: String,
    #[serde(default)]
    pub transcription_language: Option<String>,
    pub response_language: String,
    pub turn_timeout_secs: u64,
    /// Not sent to the provider unless set
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesConfig {
    pub worker_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    pub max_attempts: u32,
    pub strict_coherence: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, `AGORA_<SECTION>__<KEY>` (e.g. `AGORA_LLM__CHAT_MODEL`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("AGORA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets are never read from TOML
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message(
                    "MONGODB_URI environment variable is required for the mongodb backend"
                        .to_string(),
                )
            })?;
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn engine_config(&self) -> EngineConfig {
        let mut engine = EngineConfig::new()
            .with_chat_model(&self.llm.chat_model)
            .with_extraction_model(&self.llm.extraction_model)
            .with_synthesis_model(&self.llm.synthesis_model)
            .with_transcription(
                &self.llm.transcription_model,
                self.llm.transcription_language.clone(),
            )
            .with_response_language(&self.llm.response_language)
            .with_turn_timeout(Duration::from_secs(self.llm.turn_timeout_secs))
            .with_synthesis_attempts(self.synthesis.max_attempts)
            .with_strict_coherence(self.synthesis.strict_coherence);
        if let Some(temp) = self.llm.temperature {
            engine = engine.with_temperature(temp);
        }
        engine
    }
}
