pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;

pub use router::build_router;
