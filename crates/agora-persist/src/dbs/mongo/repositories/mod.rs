pub mod catalog;
pub mod session;
pub mod message;
pub mod profile;
pub mod synthesis;

pub use catalog::MongoCatalogRepository;
pub use session::MongoSessionRepository;
pub use message::MongoMessageRepository;
pub use profile::MongoProfileRepository;
pub use synthesis::MongoSynthesisRepository;
