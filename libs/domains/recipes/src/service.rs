use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::embedding::{Vectorizer, recipe_document};
use crate::enrich::{Preferences, QueryEnricher};
use crate::error::RecipeResult;
use crate::models::{SimilarityResult, TranslatedRecipe};
use crate::repository::{RecipePoint, RecipeVectorStore};
use crate::retriever::SimilarityRetriever;

/// Outcome of an indexing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub indexed: usize,
    /// Recipes whose embedding came back as the zero vector
    pub skipped: usize,
}

/// Recommendation service providing high-level operations
///
/// Combines the vectorizer, the query enricher and the vector index.
pub struct RecommendationService {
    vectorizer: Vectorizer,
    enricher: QueryEnricher,
    store: Arc<dyn RecipeVectorStore>,
    retriever: SimilarityRetriever,
}

impl RecommendationService {
    pub fn new(vectorizer: Vectorizer, store: Arc<dyn RecipeVectorStore>) -> Self {
        Self {
            vectorizer,
            enricher: QueryEnricher::default(),
            retriever: SimilarityRetriever::new(store.clone()),
            store,
        }
    }

    pub fn with_enricher(mut self, enricher: QueryEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub async fn ensure_collection(&self) -> RecipeResult<bool> {
        self.store
            .ensure_collection(self.vectorizer.dimension() as u32)
            .await
    }

    // ===== Indexing =====

    /// Embed and store translated recipes.
    ///
    /// Recipes that end up with a zero vector are left out of the index so
    /// they never compete in ranking.
    #[instrument(skip(self, recipes), fields(count = recipes.len()))]
    pub async fn index_recipes(
        &self,
        recipes: &[TranslatedRecipe],
        batch_size: usize,
    ) -> RecipeResult<IndexReport> {
        if recipes.is_empty() {
            return Ok(IndexReport::default());
        }
        self.ensure_collection().await?;

        let documents: Vec<String> = recipes.iter().map(recipe_document).collect();
        let vectors = self.vectorizer.embed_batch(&documents, batch_size).await;

        let mut report = IndexReport::default();
        let mut points = Vec::with_capacity(recipes.len());
        for (recipe, vector) in recipes.iter().zip(vectors) {
            if vector.is_zero() {
                warn!(url = %recipe.recipe.url, "No usable embedding, skipping");
                report.skipped += 1;
                continue;
            }
            points.push(RecipePoint {
                id: recipe.id(),
                vector,
                summary: recipe.summary(),
            });
        }

        report.indexed = self.store.upsert(points).await?;
        info!(indexed = report.indexed, skipped = report.skipped, "Indexed recipes");
        Ok(report)
    }

    pub async fn index_recipe(&self, recipe: &TranslatedRecipe) -> RecipeResult<IndexReport> {
        self.index_recipes(std::slice::from_ref(recipe), 1).await
    }

    /// Number of recipes currently held by the index.
    pub async fn indexed_count(&self) -> RecipeResult<u64> {
        self.store.count().await
    }

    // ===== Retrieval =====

    /// Enrich `text`, embed it and rank stored recipes against it.
    #[instrument(skip(self, preferences))]
    pub async fn recommend(
        &self,
        text: &str,
        preferences: &Preferences,
        top_k: usize,
        min_similarity: f32,
    ) -> RecipeResult<Vec<SimilarityResult>> {
        let query = self.enricher.enrich(text, preferences);
        let vector = self.vectorizer.embed(&query).await;
        self.retriever.search(&vector, top_k, min_similarity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingProvider, EmbeddingResult};
    use crate::error::RecipeError;
    use crate::models::{EmbeddingModel, EmbeddingProviderType, Recipe};
    use crate::repository::MockRecipeVectorStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Embeds "fail" as an error, empty-ish text as zeros, anything else as [1, 0].
    struct ScriptedProvider {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        fn provider_type(&self) -> EmbeddingProviderType {
            EmbeddingProviderType::Local
        }

        async fn embed(&self, _model: EmbeddingModel, text: &str) -> RecipeResult<EmbeddingResult> {
            self.seen.lock().unwrap().push(text.to_string());
            if text.contains("fail") {
                return Err(RecipeError::Embedding("scripted".into()));
            }
            Ok(EmbeddingResult {
                values: vec![1.0, 0.0],
                dimension: 2,
                tokens_used: 1,
            })
        }

        async fn embed_batch(
            &self,
            model: EmbeddingModel,
            texts: &[String],
        ) -> RecipeResult<Vec<EmbeddingResult>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(model.clone(), text).await?);
            }
            Ok(out)
        }
    }

    fn vectorizer() -> (Vectorizer, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider {
            seen: Mutex::new(vec![]),
        });
        let vectorizer = Vectorizer::new(provider.clone(), EmbeddingModel::custom("test-embed", 2))
            .with_batch_delay(Duration::ZERO);
        (vectorizer, provider)
    }

    fn translated(url: &str, title_en: &str) -> TranslatedRecipe {
        let mut recipe = TranslatedRecipe::untranslated(Recipe::new(url, "제목"));
        recipe.title_en = title_en.to_string();
        recipe
    }

    #[tokio::test]
    async fn test_index_skips_zero_vectors() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_ensure_collection()
            .withf(|dim| *dim == 2)
            .times(1)
            .returning(|_| Ok(true));
        store
            .expect_upsert()
            .withf(|points| points.len() == 1 && points[0].summary.title_en == "Beef stew")
            .times(1)
            .returning(|points| Ok(points.len()));

        let (vectorizer, _) = vectorizer();
        let service = RecommendationService::new(vectorizer, Arc::new(store));
        let report = service
            .index_recipes(
                &[translated("a", "Beef stew"), translated("b", "fail")],
                10,
            )
            .await
            .unwrap();

        assert_eq!(report, IndexReport { indexed: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn test_recommend_embeds_enriched_query() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_search()
            .withf(|_, limit, min| *limit == 5 && *min == 0.1)
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let (vectorizer, provider) = vectorizer();
        let service = RecommendationService::new(vectorizer, Arc::new(store));
        service
            .recommend("두부 요리", &Preferences::default(), 5, 0.1)
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &["두부 요리 tofu tofu recipe\nPreferences: spiciness=normal, saltiness=normal."]
        );
    }

    #[tokio::test]
    async fn test_custom_enricher_shapes_query() {
        let mut store = MockRecipeVectorStore::new();
        store.expect_search().returning(|_, _, _| Ok(vec![]));

        let (vectorizer, provider) = vectorizer();
        let service = RecommendationService::new(vectorizer, Arc::new(store))
            .with_enricher(QueryEnricher::new().with_synonym("곤약", "konjac"));
        service
            .recommend("곤약", &Preferences::default(), 3, 0.0)
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].starts_with("곤약 konjac\n"));
    }

    #[tokio::test]
    async fn test_indexed_count_reads_store() {
        let mut store = MockRecipeVectorStore::new();
        store.expect_count().times(1).returning(|| Ok(42));

        let (vectorizer, _) = vectorizer();
        let service = RecommendationService::new(vectorizer, Arc::new(store));
        assert_eq!(service.indexed_count().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockRecipeVectorStore::new();
        store
            .expect_ensure_collection()
            .returning(|_| Err(RecipeError::VectorStore("connection refused".into())));

        let (vectorizer, _) = vectorizer();
        let service = RecommendationService::new(vectorizer, Arc::new(store));
        let err = service
            .index_recipe(&translated("a", "Beef"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::VectorStore(_)));
    }
}
