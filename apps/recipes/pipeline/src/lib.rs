//! Recipe Pipeline
//!
//! Command-line front end for the recipe domain.
//!
//! ## Architecture
//!
//! ```text
//! recipes.json
//!   ↓ translate (ParallelTranslator, credential pool, JSON cache)
//! recipes_en.json
//!   ↓ index (Vectorizer → Qdrant)
//! Qdrant collection
//!   ↑ search (QueryEnricher → Vectorizer → SimilarityRetriever)
//! ```
//!
//! ## Modules
//!
//! - `cli`: Argument definitions
//! - `commands`: Wiring from environment configuration to domain services

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::run;
