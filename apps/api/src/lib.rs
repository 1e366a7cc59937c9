pub mod client;
pub mod config;
pub mod cover_letter;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod models;
pub mod render;
pub mod rewrite;
pub mod routes;
pub mod state;
