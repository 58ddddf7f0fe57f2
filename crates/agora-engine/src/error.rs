use agora_persist::PersistError;
use agora_types::SchemaViolation;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Topic not found: {0}")]
    TopicNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Generation failed: {0}")]
    Generation(#[from] anyhow::Error),

    #[error("Invalid structured output: {0}")]
    InvalidOutput(String),

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("Reply generation exceeded {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Persist(#[from] PersistError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
