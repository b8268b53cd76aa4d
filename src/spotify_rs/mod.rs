pub mod auth;
pub mod client;
pub mod token_cache;
pub mod types;
