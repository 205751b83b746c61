pub mod catalog;
pub mod chunker;
pub mod config;
pub mod cosine;
pub mod error;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod prompt;
pub mod protocol;
pub mod recommender;
pub mod server;
pub mod store;
pub mod transport;
pub mod types;
