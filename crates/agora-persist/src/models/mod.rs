mod topic;
mod session;
mod profile;
mod synthesis;

// Export database-agnostic models
pub use topic::{Artifact, Topic};
pub use session::{ChatMessage, ChatSession, MessageRole};
pub use profile::UserProfile;
pub use synthesis::PerspectiveSynthesis;
