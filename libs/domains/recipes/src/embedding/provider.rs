use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecipeResult;
use crate::models::{EmbeddingModel, EmbeddingProviderType};

/// Raw output of one embedding call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
    pub tokens_used: u32,
}

/// Trait for embedding generation providers
///
/// Implementations can call a hosted API or a locally served model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> EmbeddingProviderType;

    /// Generate embedding for a single text
    async fn embed(&self, model: EmbeddingModel, text: &str) -> RecipeResult<EmbeddingResult>;

    /// Generate embeddings for multiple texts in one request, in input order
    async fn embed_batch(
        &self,
        model: EmbeddingModel,
        texts: &[String],
    ) -> RecipeResult<Vec<EmbeddingResult>>;
}
