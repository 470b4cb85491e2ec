pub mod agents;
pub mod config;
pub mod error;
pub mod github;
pub mod llm;
pub mod reports;
pub mod search;
pub mod summary;
pub mod types;
