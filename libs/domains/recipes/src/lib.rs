//! Recipe Domain Library
//!
//! Translates Korean recipe text to English, embeds the result and serves
//! similarity-ranked recommendations from a vector index.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐     ┌──────────────────────┐
//! │ ParallelTranslator │ ──▶ │ RecommendationService│  ← indexing and recommend()
//! └─────────┬──────────┘     └──────────┬───────────┘
//!           │                           │
//! ┌─────────▼──────────┐     ┌──────────▼───────────┐     ┌─────────────────────┐
//! │ CredentialPool     │     │ QueryEnricher        │     │ SimilarityRetriever │
//! │ TranslationCache   │     │ Vectorizer           │ ──▶ │                     │
//! │ TranslationBackend │     │ EmbeddingProvider    │     └──────────┬──────────┘
//! │   (trait)          │     │   (trait)            │                │
//! └─────────┬──────────┘     └──────────┬───────────┘     ┌──────────▼──────────┐
//!           │                           │                 │ RecipeVectorStore   │
//! ┌─────────▼──────────┐     ┌──────────▼───────────┐     │   (trait)           │
//! │ OpenAITranslator   │     │ OpenAIProvider       │     └──────────┬──────────┘
//! └────────────────────┘     └──────────────────────┘     ┌──────────▼──────────┐
//!                                                         │ QdrantRecipeStore   │
//!                                                         └─────────────────────┘
//! ```
//!
//! # Features
//!
//! - **Credential rotation**: Round-robin over up to 10 API keys, shared by all workers
//! - **Write-through cache**: Source text to translation, persisted as JSON after every new entry
//! - **Parallel translation**: Deduplicated fan-out bounded by the pool size, order restored per field and per batch
//! - **Graceful degradation**: Failed calls fall back to the source text or the zero vector
//! - **Query enrichment**: Korean keywords widened with English synonyms and taste preferences
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_recipes::{
//!     CredentialPool, OpenAITranslator, ParallelTranslator, Preferences, QdrantConfig,
//!     QdrantRecipeStore, RecommendationService, TranslationCache, TranslatorConfig,
//!     Vectorizer, VectorizerConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(recipes: Vec<domain_recipes::Recipe>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = TranslatorConfig::from_env()?;
//! let translator = ParallelTranslator::new(
//!     Arc::new(CredentialPool::from_env()?),
//!     Arc::new(TranslationCache::load(&config.cache_file).await),
//!     Arc::new(OpenAITranslator::new(&config)),
//! )
//! .with_delay(config.delay);
//!
//! let translated = translator.translate_all(recipes).await;
//!
//! let vectorizer_config = VectorizerConfig::from_env()?;
//! let service = RecommendationService::new(
//!     Vectorizer::from_config(&vectorizer_config)?,
//!     Arc::new(QdrantRecipeStore::new(QdrantConfig::from_env()?)?),
//! );
//! service
//!     .index_recipes(&translated, vectorizer_config.batch_size)
//!     .await?;
//!
//! let _results = service
//!     .recommend("소고기 요리 추천해줘", &Preferences::default(), 10, 0.1)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod credentials;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod models;
pub mod qdrant;
pub mod repository;
pub mod retriever;
pub mod service;
pub mod translation;

// Re-export commonly used types
pub use cache::TranslationCache;
pub use credentials::{CredentialPool, CredentialSlot};
pub use embedding::{
    EmbeddingProvider, EmbeddingResult, OpenAIConfig, OpenAIProvider, Vectorizer,
    VectorizerConfig, recipe_document,
};
pub use enrich::{PreferenceLevel, Preferences, QueryEnricher};
pub use error::{RecipeError, RecipeResult};
pub use models::{
    CookingStep, EmbeddingModel, EmbeddingProviderType, EmbeddingVector, Recipe, RecipeSummary,
    SimilarityResult, TranslatedRecipe,
};
pub use qdrant::{QdrantConfig, QdrantRecipeStore};
pub use repository::{RecipePoint, RecipeVectorStore};
pub use retriever::SimilarityRetriever;
pub use service::{IndexReport, RecommendationService};
pub use translation::{
    OpenAITranslator, ParallelTranslator, TranslationBackend, TranslatorConfig, needs_translation,
};
