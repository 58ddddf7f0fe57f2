pub mod models;
pub mod error;
pub mod trait_client;
pub mod memory;
pub mod dbs;

pub use models::{
    Artifact, ChatMessage, ChatSession, MessageRole, PerspectiveSynthesis, Topic, UserProfile,
};
pub use trait_client::{PersistenceClient, TopicCatalog};
pub use memory::MemoryPersistenceClient;
pub use error::{PersistError, Result};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
