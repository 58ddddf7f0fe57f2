pub mod config;
pub mod error;
pub mod markers;
pub mod prompts;
pub mod trigger;
pub mod dispatch;
pub mod extractor;
pub mod profiles;
pub mod orchestrator;
pub mod synthesis;
pub mod transcription;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use markers::{parse_reply, resolve_artifacts, ParsedReply};
pub use trigger::{messages_until_next_update, should_generate};
pub use dispatch::{ProfileDispatch, ProfileJob, ProfileJobQueue};
pub use extractor::ProfileExtractor;
pub use profiles::{ChatHistory, ProfileService, ProfileStatus};
pub use orchestrator::{ConversationPhase, Orchestrator, TurnOutcome};
pub use synthesis::{SynthesisEngine, SynthesisOutcome, SynthesisStatus};
pub use transcription::TranscriptionService;

// Identity is resolved at the edge and threaded through every call
pub use agora_types::ParticipantIdentity;
