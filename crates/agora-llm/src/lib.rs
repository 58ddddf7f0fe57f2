pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod config;
pub mod openai;
#[cfg(feature = "mock")]
pub mod mock;

pub use traits::{
    ChatClient,
    StructuredClient,
    Transcriber,
    LLMClient,
    ChatRequest, ChatResponse, ChatOptions,
    StructuredRequest, StructuredResponse,
    TranscriptionRequest,
    TokenUsage,
    EventStream,
};

pub use streaming::StreamEvent;
pub use buffer_utils::CircularLineBuffer;
pub use config::OpenAIConfig;
pub use openai::OpenAIClient;
pub use types::{Message, Content};
