use std::sync::Arc;
use std::time::Duration;

use core_config::{FromEnv, env_flag, env_optional, env_parse_or};
use tracing::{debug, info, instrument, warn};

use super::EmbeddingProvider;
use super::openai::{OpenAIConfig, OpenAIProvider};
use crate::error::{RecipeError, RecipeResult};
use crate::models::{EmbeddingModel, EmbeddingProviderType, EmbeddingVector};
use crate::translation::seconds;

/// Vectorizer configuration
#[derive(Debug, Clone)]
pub struct VectorizerConfig {
    pub use_openai: bool,
    pub model: EmbeddingModel,
    /// OpenAI-compatible endpoint serving the local model
    pub local_url: String,
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub batch_delay: Duration,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            use_openai: true,
            model: EmbeddingModel::TextEmbedding3Small,
            local_url: "http://localhost:8081/v1".to_string(),
            batch_size: 100,
            batch_delay: Duration::from_secs(1),
        }
    }
}

impl VectorizerConfig {
    /// Reads `USE_OPENAI_EMBEDDINGS`, `EMBEDDING_MODEL`, `LOCAL_EMBEDDING_URL`,
    /// `VECTORIZATION_BATCH_SIZE` and `VECTORIZATION_DELAY`.
    pub fn from_env() -> RecipeResult<Self> {
        let defaults = Self::default();
        let use_openai = env_flag("USE_OPENAI_EMBEDDINGS", true)?;

        let model = match env_optional("EMBEDDING_MODEL") {
            Some(name) => name.parse()?,
            None if use_openai => EmbeddingModel::TextEmbedding3Small,
            None => EmbeddingModel::AllMiniLmL6V2,
        };

        let backend = if use_openai {
            EmbeddingProviderType::OpenAI
        } else {
            EmbeddingProviderType::Local
        };
        if !model.served_by(backend) {
            return Err(RecipeError::Config(format!(
                "Embedding model {} is not served by the {:?} backend (USE_OPENAI_EMBEDDINGS={})",
                model.model_name(),
                backend,
                use_openai
            )));
        }

        let batch_size: usize = env_parse_or("VECTORIZATION_BATCH_SIZE", defaults.batch_size)?;
        if batch_size == 0 {
            return Err(RecipeError::Config(
                "VECTORIZATION_BATCH_SIZE must be positive".to_string(),
            ));
        }
        let delay_secs: f64 = env_parse_or("VECTORIZATION_DELAY", 1.0)?;

        Ok(Self {
            use_openai,
            model,
            local_url: env_optional("LOCAL_EMBEDDING_URL").unwrap_or(defaults.local_url),
            batch_size,
            batch_delay: seconds("VECTORIZATION_DELAY", delay_secs)?,
        })
    }

    /// Build the provider this configuration selects.
    pub fn provider(&self) -> RecipeResult<Arc<dyn EmbeddingProvider>> {
        let config = if self.use_openai {
            OpenAIConfig::from_env()?
        } else {
            OpenAIConfig::local(self.local_url.clone())
        };
        Ok(Arc::new(OpenAIProvider::new(config)?))
    }
}

/// Turns text into fixed-length vectors.
///
/// Never fails: empty text, a failed call and a malformed response all
/// produce the zero vector of the configured dimension.
#[derive(Clone)]
pub struct Vectorizer {
    provider: Arc<dyn EmbeddingProvider>,
    model: EmbeddingModel,
    batch_delay: Duration,
}

impl Vectorizer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, model: EmbeddingModel) -> Self {
        Self {
            provider,
            model,
            batch_delay: Duration::from_secs(1),
        }
    }

    pub fn from_config(config: &VectorizerConfig) -> RecipeResult<Self> {
        Ok(Self::new(config.provider()?, config.model.clone()).with_batch_delay(config.batch_delay))
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.model.dimension() as usize
    }

    /// Embed one text, surfacing backend errors.
    pub async fn try_embed(&self, text: &str) -> RecipeResult<EmbeddingVector> {
        if text.trim().is_empty() {
            return Ok(EmbeddingVector::zeros(self.dimension()));
        }
        let result = self.provider.embed(self.model.clone(), text).await?;
        self.checked(result.values)
    }

    /// Embed one text; the zero vector on empty input or failure.
    pub async fn embed(&self, text: &str) -> EmbeddingVector {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(error = %e, "Embedding failed, using zero vector");
                EmbeddingVector::zeros(self.dimension())
            }
        }
    }

    /// Embed `texts` in chunks of `batch_size`, one vector per input, in order.
    ///
    /// A chunk whose request fails is retried item by item.
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Vec<EmbeddingVector> {
        let chunks: Vec<&[String]> = texts.chunks(batch_size.max(1)).collect();
        let total = chunks.len();
        let mut vectors = Vec::with_capacity(texts.len());

        for (n, chunk) in chunks.into_iter().enumerate() {
            debug!(batch = n + 1, total, size = chunk.len(), "Embedding batch");
            vectors.extend(self.embed_chunk(chunk).await);

            if n + 1 < total && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!(count = vectors.len(), "Embedded texts");
        vectors
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Vec<EmbeddingVector> {
        // Blank entries never reach the provider
        let (positions, inputs): (Vec<usize>, Vec<String>) = chunk
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, text.clone()))
            .unzip();

        let mut vectors = vec![EmbeddingVector::zeros(self.dimension()); chunk.len()];
        if inputs.is_empty() {
            return vectors;
        }

        match self.request_chunk(&inputs).await {
            Ok(embedded) => {
                for (position, vector) in positions.into_iter().zip(embedded) {
                    vectors[position] = vector;
                }
            }
            Err(e) => {
                warn!(error = %e, size = inputs.len(), "Batch embedding failed, falling back to single requests");
                for (position, text) in positions.into_iter().zip(&inputs) {
                    vectors[position] = self.embed(text).await;
                }
            }
        }
        vectors
    }

    async fn request_chunk(&self, inputs: &[String]) -> RecipeResult<Vec<EmbeddingVector>> {
        let results = self.provider.embed_batch(self.model.clone(), inputs).await?;
        if results.len() != inputs.len() {
            return Err(RecipeError::Embedding(format!(
                "Expected {} embeddings, got {}",
                inputs.len(),
                results.len()
            )));
        }
        results
            .into_iter()
            .map(|result| self.checked(result.values))
            .collect()
    }

    fn checked(&self, values: Vec<f32>) -> RecipeResult<EmbeddingVector> {
        if values.len() != self.dimension() {
            return Err(RecipeError::Embedding(format!(
                "Expected dimension {}, got {}",
                self.dimension(),
                values.len()
            )));
        }
        Ok(EmbeddingVector::new(values))
    }
}
