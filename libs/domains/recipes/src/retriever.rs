use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{RecipeError, RecipeResult};
use crate::models::{EmbeddingVector, SimilarityResult};
use crate::repository::RecipeVectorStore;

/// Ranks stored recipes against a query vector.
///
/// Scores come from the index; results are never re-scored or re-sorted
/// here, so ties keep the order the index returned them in.
#[derive(Clone)]
pub struct SimilarityRetriever {
    store: Arc<dyn RecipeVectorStore>,
}

impl SimilarityRetriever {
    pub fn new(store: Arc<dyn RecipeVectorStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, query), fields(dimension = query.dimension()))]
    pub async fn search(
        &self,
        query: &EmbeddingVector,
        top_k: usize,
        min_similarity: f32,
    ) -> RecipeResult<Vec<SimilarityResult>> {
        if !min_similarity.is_finite() {
            return Err(RecipeError::Validation(format!(
                "min_similarity must be finite, got {}",
                min_similarity
            )));
        }
        if top_k == 0 {
            return Ok(vec![]);
        }
        // A zero query has no direction to compare against
        if query.is_zero() {
            debug!("Zero query vector, nothing to rank");
            return Ok(vec![]);
        }

        let candidates = self
            .store
            .search(query.as_slice().to_vec(), top_k, min_similarity)
            .await?;

        let results: Vec<SimilarityResult> = candidates
            .into_iter()
            .filter(|r| r.score >= min_similarity)
            .take(top_k)
            .collect();

        debug!(count = results.len(), "Retrieved candidates");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecipeSummary;
    use crate::repository::MockRecipeVectorStore;
    use uuid::Uuid;

    fn hit(n: u128, score: f32) -> SimilarityResult {
        SimilarityResult {
            id: Uuid::from_u128(n),
            score,
            recipe: RecipeSummary {
                url: format!("https://example.com/recipe/{}", n),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_search_delegates_threshold_and_limit() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_search()
            .withf(|vector, limit, min| vector == &vec![1.0, 0.0] && *limit == 2 && *min == 0.3)
            .times(1)
            .returning(|_, _, _| Ok(vec![hit(1, 0.9), hit(2, 0.5)]));

        let retriever = SimilarityRetriever::new(Arc::new(store));
        let results = retriever
            .search(&EmbeddingVector::new(vec![1.0, 0.0]), 2, 0.3)
            .await
            .unwrap();

        let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.9, 0.5]);
    }

    #[tokio::test]
    async fn test_search_enforces_contract_on_loose_store() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_search()
            .returning(|_, _, _| Ok(vec![hit(1, 0.9), hit(2, 0.5), hit(3, 0.2)]));

        let retriever = SimilarityRetriever::new(Arc::new(store));
        let results = retriever
            .search(&EmbeddingVector::new(vec![0.0, 1.0]), 5, 0.3)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score >= 0.3));
    }

    #[tokio::test]
    async fn test_ties_keep_store_order() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_search()
            .returning(|_, _, _| Ok(vec![hit(7, 0.8), hit(3, 0.8), hit(5, 0.8)]));

        let retriever = SimilarityRetriever::new(Arc::new(store));
        let results = retriever
            .search(&EmbeddingVector::new(vec![1.0]), 3, 0.0)
            .await
            .unwrap();

        let ids: Vec<Uuid> = results.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![Uuid::from_u128(7), Uuid::from_u128(3), Uuid::from_u128(5)]
        );
    }

    #[tokio::test]
    async fn test_zero_query_and_zero_k_skip_store() {
        let mut store = MockRecipeVectorStore::new();
        store.expect_search().never();

        let retriever = SimilarityRetriever::new(Arc::new(store));
        assert!(retriever
            .search(&EmbeddingVector::zeros(3), 10, 0.0)
            .await
            .unwrap()
            .is_empty());
        assert!(retriever
            .search(&EmbeddingVector::new(vec![1.0]), 0, 0.0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_nan_threshold_rejected() {
        let retriever = SimilarityRetriever::new(Arc::new(MockRecipeVectorStore::new()));
        let err = retriever
            .search(&EmbeddingVector::new(vec![1.0]), 3, f32::NAN)
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::Validation(_)));
    }
}
