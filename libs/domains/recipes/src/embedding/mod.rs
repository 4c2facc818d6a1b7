mod document;
mod openai;
mod provider;
mod vectorizer;

pub use document::recipe_document;
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::{EmbeddingProvider, EmbeddingResult};
pub use vectorizer::{Vectorizer, VectorizerConfig};
