use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RecipeResult;
use crate::models::{EmbeddingVector, RecipeSummary, SimilarityResult};

/// A recipe's vector together with the fields shown in results.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipePoint {
    pub id: Uuid,
    pub vector: EmbeddingVector,
    pub summary: RecipeSummary,
}

/// Repository trait for the persisted vector index
///
/// Similarity is cosine similarity (`1 - cosine distance`), computed by
/// the index itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeVectorStore: Send + Sync {
    /// Create the collection if it does not exist. Returns true when created.
    async fn ensure_collection(&self, dimension: u32) -> RecipeResult<bool>;

    /// Insert or overwrite points by id
    async fn upsert(&self, points: Vec<RecipePoint>) -> RecipeResult<usize>;

    /// Nearest neighbours of `vector`, best first, at most `limit`,
    /// none scoring below `min_similarity`
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        min_similarity: f32,
    ) -> RecipeResult<Vec<SimilarityResult>>;

    /// Number of stored points
    async fn count(&self) -> RecipeResult<u64>;
}
