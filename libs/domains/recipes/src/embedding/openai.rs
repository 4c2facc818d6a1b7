use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use super::provider::EmbeddingResult;
use crate::error::{RecipeError, RecipeResult};
use crate::models::{EmbeddingModel, EmbeddingProviderType};

/// OpenAI-compatible embeddings endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Absent for local servers that do not check credentials
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Some(api_key),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// A locally served model, e.g. `http://localhost:11434/v1`.
    pub fn local(base_url: String) -> Self {
        Self {
            api_key: None,
            base_url,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl FromEnv for OpenAIConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("OPENAI_API_KEY")?;
        let base_url = env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
        let timeout_secs: u64 = env_parse_or("EMBEDDING_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_key: Some(api_key),
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// OpenAI embeddings provider; also serves local OpenAI-compatible servers
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
    provider_type: EmbeddingProviderType,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> RecipeResult<Self> {
        let provider_type = if config.api_key.is_some() {
            EmbeddingProviderType::OpenAI
        } else {
            EmbeddingProviderType::Local
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RecipeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            provider_type,
        })
    }

    fn request_error(&self, err: reqwest::Error) -> RecipeError {
        if err.is_timeout() {
            RecipeError::Timeout(self.config.timeout)
        } else {
            RecipeError::Embedding(err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn provider_type(&self) -> EmbeddingProviderType {
        self.provider_type
    }

    async fn embed(&self, model: EmbeddingModel, text: &str) -> RecipeResult<EmbeddingResult> {
        let results = self.embed_batch(model, &[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RecipeError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(
        &self,
        model: EmbeddingModel,
        texts: &[String],
    ) -> RecipeResult<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let dimensions = match &model {
            EmbeddingModel::Custom { dimension, .. } => Some(*dimension),
            _ => None,
        };

        let request = EmbeddingRequest {
            model: model.model_name(),
            input: texts,
            dimensions,
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url.trim_end_matches('/')))
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RecipeError::Embedding(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse =
            response.json().await.map_err(|e| self.request_error(e))?;

        if embedding_response.data.len() != texts.len() {
            return Err(RecipeError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embedding_response.data.len()
            )));
        }

        // Sort by index to maintain order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        let tokens_per_embedding = embedding_response
            .usage
            .map(|u| u.total_tokens / texts.len() as u32)
            .unwrap_or(0);

        Ok(data
            .into_iter()
            .map(|d| EmbeddingResult {
                dimension: d.embedding.len() as u32,
                values: d.embedding,
                tokens_used: tokens_per_embedding,
            })
            .collect())
    }
}
