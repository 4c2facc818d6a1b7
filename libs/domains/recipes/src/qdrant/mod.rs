mod client;
mod config;

pub use client::QdrantRecipeStore;
pub use config::QdrantConfig;
