//! Command execution
//!
//! Every command builds its services from the environment:
//! - Credential pool from `OPENAI_API_KEY`, `OPENAI_API_KEY_2` .. `OPENAI_API_KEY_10`
//! - Translator and cache from `TranslatorConfig`
//! - Vectorizer from `VectorizerConfig`
//! - Vector index from `QdrantConfig`

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use core_config::{Environment, FromEnv};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_recipes::{
    CredentialPool, OpenAITranslator, ParallelTranslator, Preferences, QdrantConfig,
    QdrantRecipeStore, Recipe, RecommendationService, TranslatedRecipe, TranslationCache,
    TranslatorConfig, Vectorizer, VectorizerConfig,
};
use eyre::{Result, WrapErr};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::cli::{Cli, Commands};

/// Parse arguments, set up logging and run the selected command.
pub async fn run() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    execute(cli.command).await
}

pub async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Translate {
            input,
            output,
            repair,
        } => translate(&input, &output, repair).await,
        Commands::Index { input, batch_size } => index(&input, batch_size).await,
        Commands::Search {
            query,
            top_k,
            min_similarity,
            spiciness,
            saltiness,
        } => {
            let preferences = Preferences::new(spiciness, saltiness);
            search(&query, &preferences, top_k, min_similarity).await
        }
    }
}

async fn translator() -> Result<ParallelTranslator> {
    let config = TranslatorConfig::from_env().wrap_err("Failed to load translator configuration")?;
    let pool = CredentialPool::from_env().wrap_err("No usable OpenAI API key configured")?;
    let cache = TranslationCache::load(&config.cache_file).await;

    info!(
        credentials = pool.len(),
        cached = cache.len().await,
        model = %config.model,
        "Translator ready"
    );

    Ok(ParallelTranslator::new(
        Arc::new(pool),
        Arc::new(cache),
        Arc::new(OpenAITranslator::new(&config)),
    )
    .with_delay(config.delay)
    .with_call_timeout(config.call_timeout))
}

fn recommendation_service() -> Result<(RecommendationService, VectorizerConfig)> {
    let vectorizer_config =
        VectorizerConfig::from_env().wrap_err("Failed to load vectorizer configuration")?;
    let vectorizer =
        Vectorizer::from_config(&vectorizer_config).wrap_err("Failed to set up embeddings")?;

    let qdrant_config = QdrantConfig::from_env().wrap_err("Failed to load Qdrant configuration")?;
    info!(url = %qdrant_config.url, collection = %qdrant_config.collection, "Using Qdrant");
    let store = QdrantRecipeStore::new(qdrant_config).wrap_err("Failed to connect to Qdrant")?;

    Ok((
        RecommendationService::new(vectorizer, Arc::new(store)),
        vectorizer_config,
    ))
}

async fn translate(input: &Path, output: &Path, repair: bool) -> Result<()> {
    let translator = translator().await?;

    let translated: Vec<TranslatedRecipe> = if repair {
        let recipes: Vec<TranslatedRecipe> = read_json(input).await?;
        let mut repaired = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            repaired.push(translator.fill_missing(recipe).await);
        }
        repaired
    } else {
        let recipes: Vec<Recipe> = read_json(input).await?;
        translator.translate_all(recipes).await
    };

    write_json(output, &translated).await?;
    info!(
        recipes = translated.len(),
        cached = translator.cache().len().await,
        output = %output.display(),
        "Translation complete"
    );
    Ok(())
}

async fn index(input: &Path, batch_size: Option<usize>) -> Result<()> {
    let recipes: Vec<TranslatedRecipe> = read_json(input).await?;
    let (service, config) = recommendation_service()?;

    let report = service
        .index_recipes(&recipes, batch_size.unwrap_or(config.batch_size))
        .await
        .wrap_err("Indexing failed")?;

    let total = service
        .indexed_count()
        .await
        .wrap_err("Failed to count indexed recipes")?;
    info!(
        model = service.vectorizer().model().model_name(),
        dimension = service.vectorizer().dimension(),
        total,
        "Index updated"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn search(
    query: &str,
    preferences: &Preferences,
    top_k: usize,
    min_similarity: f32,
) -> Result<()> {
    let (service, _) = recommendation_service()?;

    let results = service
        .recommend(query, preferences, top_k, min_similarity)
        .await
        .wrap_err("Search failed")?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).wrap_err_with(|| format!("Invalid JSON in {}", path.display()))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .wrap_err_with(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_files_roundtrip_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("recipes_en.json");

        let recipes = vec![TranslatedRecipe::untranslated(
            Recipe::new("https://example.com/recipe/1", "된장찌개").with_ingredients(["된장"]),
        )];
        write_json(&path, &recipes).await.unwrap();

        let loaded: Vec<TranslatedRecipe> = read_json(&path).await.unwrap();
        assert_eq!(loaded, recipes);
    }

    #[tokio::test]
    async fn test_read_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"[{").await.unwrap();

        let err = read_json::<Vec<Recipe>>(&path).await.unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
