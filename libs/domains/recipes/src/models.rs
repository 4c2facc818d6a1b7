use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecipeError;

/// A cooking step as scraped: bare text or text with an illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StepRepr")]
pub struct CookingStep {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CookingStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepRepr {
    Text(String),
    Detailed {
        #[serde(default)]
        text: String,
        #[serde(default)]
        image: Option<String>,
    },
}

impl From<StepRepr> for CookingStep {
    fn from(repr: StepRepr) -> Self {
        match repr {
            StepRepr::Text(text) => CookingStep { text, image: None },
            StepRepr::Detailed { text, image } => CookingStep {
                text,
                image: image.filter(|i| !i.is_empty()),
            },
        }
    }
}

/// A raw recipe record in its source language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recipe {
    /// Source URL; the recipe's identity.
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub cooking_steps: Vec<CookingStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<String>,
}

impl Recipe {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_ingredients<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ingredients = ingredients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cooking_steps = steps.into_iter().map(CookingStep::new).collect();
        self
    }

    /// Stable point id derived from the recipe URL, so re-indexing overwrites.
    pub fn id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, self.url.as_bytes())
    }
}

/// A recipe together with its English rendering.
///
/// `ingredients_en[i]` is the translation of `ingredients[i]`, and likewise
/// for cooking steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub ingredients_en: Vec<String>,
    #[serde(default)]
    pub cooking_steps_en: Vec<String>,
}

impl TranslatedRecipe {
    /// A rendering that carries the source text in every English field.
    pub fn untranslated(recipe: Recipe) -> Self {
        Self {
            title_en: recipe.title.clone(),
            description_en: recipe.description.clone(),
            ingredients_en: recipe.ingredients.clone(),
            cooking_steps_en: recipe.cooking_steps.iter().map(|s| s.text.clone()).collect(),
            recipe,
        }
    }

    pub fn id(&self) -> Uuid {
        self.recipe.id()
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            url: self.recipe.url.clone(),
            title: self.recipe.title.clone(),
            title_en: self.title_en.clone(),
            description_en: self.description_en.clone(),
            cooking_time: self.recipe.cooking_time.clone(),
            servings: self.recipe.servings.clone(),
        }
    }
}

/// Presentation fields stored next to a recipe's vector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
}

/// Fixed-length embedding of one text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// The fallback vector for empty input or a failed call.
    pub fn zeros(dimension: usize) -> Self {
        Self(vec![0.0; dimension])
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// One ranked candidate; computed per query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub id: Uuid,
    /// `1 - cosine_distance(query, item)`
    pub score: f32,
    pub recipe: RecipeSummary,
}

/// Embedding provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingProviderType {
    #[default]
    OpenAI,
    /// A locally served model behind an OpenAI-compatible endpoint
    Local,
}

/// Embedding model selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingModel {
    /// OpenAI text-embedding-3-small (1536 dimensions)
    #[default]
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    TextEmbedding3Large,
    /// OpenAI text-embedding-ada-002 (1536 dimensions, legacy)
    TextEmbeddingAda002,
    /// sentence-transformers all-MiniLM-L6-v2 (384 dimensions)
    AllMiniLmL6V2,
    /// Any other served model, by name, with its output dimension
    Custom { name: String, dimension: u32 },
}

impl EmbeddingModel {
    pub fn custom(name: impl Into<String>, dimension: u32) -> Self {
        EmbeddingModel::Custom {
            name: name.into(),
            dimension,
        }
    }

    pub fn dimension(&self) -> u32 {
        match self {
            EmbeddingModel::TextEmbedding3Small => 1536,
            EmbeddingModel::TextEmbedding3Large => 3072,
            EmbeddingModel::TextEmbeddingAda002 => 1536,
            EmbeddingModel::AllMiniLmL6V2 => 384,
            EmbeddingModel::Custom { dimension, .. } => *dimension,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
            EmbeddingModel::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            EmbeddingModel::Custom { name, .. } => name.as_str(),
        }
    }

    pub fn provider(&self) -> EmbeddingProviderType {
        match self {
            EmbeddingModel::TextEmbedding3Small
            | EmbeddingModel::TextEmbedding3Large
            | EmbeddingModel::TextEmbeddingAda002 => EmbeddingProviderType::OpenAI,
            EmbeddingModel::AllMiniLmL6V2 | EmbeddingModel::Custom { .. } => {
                EmbeddingProviderType::Local
            }
        }
    }

    /// Whether requests for this model can go to `provider`.
    ///
    /// Custom models are served by either backend.
    pub fn served_by(&self, provider: EmbeddingProviderType) -> bool {
        matches!(self, EmbeddingModel::Custom { .. }) || self.provider() == provider
    }
}

impl FromStr for EmbeddingModel {
    type Err = RecipeError;

    /// Accepts a model name, or `custom:<name>:<dimension>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text-embedding-3-small" => Ok(EmbeddingModel::TextEmbedding3Small),
            "text-embedding-3-large" => Ok(EmbeddingModel::TextEmbedding3Large),
            "text-embedding-ada-002" => Ok(EmbeddingModel::TextEmbeddingAda002),
            "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLmL6V2),
            other => match other.strip_prefix("custom:") {
                Some(custom) => parse_custom(custom),
                None => Err(RecipeError::Config(format!(
                    "Unknown embedding model: {}",
                    other
                ))),
            },
        }
    }
}

// Names may contain ':' themselves (`nomic-embed-text:latest`), so the
// dimension is taken from the last segment.
fn parse_custom(custom: &str) -> Result<EmbeddingModel, RecipeError> {
    let invalid = || {
        RecipeError::Config(format!(
            "Invalid custom embedding model '{}', expected custom:<name>:<dimension>",
            custom
        ))
    };

    let (name, dimension) = custom.rsplit_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    let dimension: u32 = dimension.trim().parse().map_err(|_| invalid())?;
    if name.is_empty() || dimension == 0 {
        return Err(invalid());
    }

    Ok(EmbeddingModel::Custom {
        name: name.to_string(),
        dimension,
    })
}
