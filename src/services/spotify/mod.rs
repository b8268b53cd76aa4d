pub mod client;
pub mod diff;
pub mod library;
