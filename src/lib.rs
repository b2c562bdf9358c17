pub mod auth;
pub mod client; // feed UI state: optimistic likes, infinite scroll
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod openapi;
pub mod repo;
pub mod routes;
pub mod security;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
