use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecipeResult<T> = Result<T, RecipeError>;

impl RecipeError {
    /// Failures of a single backend call that callers recover from locally
    /// with a fallback value.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RecipeError::Translation(_) | RecipeError::Embedding(_) | RecipeError::Timeout(_)
        )
    }
}

impl From<ConfigError> for RecipeError {
    fn from(err: ConfigError) -> Self {
        RecipeError::Config(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for RecipeError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        RecipeError::VectorStore(err.to_string())
    }
}

impl From<serde_json::Error> for RecipeError {
    fn from(err: serde_json::Error) -> Self {
        RecipeError::Internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for RecipeError {
    fn from(err: std::io::Error) -> Self {
        RecipeError::Cache(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transient_classification() {
        assert!(RecipeError::Translation("502".into()).is_transient());
        assert!(RecipeError::Embedding("reset".into()).is_transient());
        assert!(RecipeError::Timeout(Duration::from_secs(30)).is_transient());

        assert!(!RecipeError::Config("no keys".into()).is_transient());
        assert!(!RecipeError::Cache("disk full".into()).is_transient());
        assert!(!RecipeError::VectorStore("down".into()).is_transient());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: RecipeError = ConfigError::MissingEnvVar("OPENAI_API_KEY".into()).into();
        assert!(matches!(err, RecipeError::Config(_)));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
