use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain_recipes::{PreferenceLevel, RecipeError};

#[derive(Debug, Parser)]
#[command(name = "recipe-pipeline")]
#[command(about = "Translate Korean recipes, index their embeddings and search them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Translate a JSON array of recipes to English
    Translate {
        /// Source recipes (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the translated recipes
        #[arg(short, long)]
        output: PathBuf,

        /// Treat the input as already translated and only redo fields
        /// whose English text is missing or still Korean
        #[arg(long)]
        repair: bool,
    },

    /// Embed translated recipes and store them in the vector index
    Index {
        /// Translated recipes (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Texts per embedding request. Defaults to VECTORIZATION_BATCH_SIZE.
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Recommend recipes for a free-text query
    Search {
        /// What the user asked for, in Korean or English
        query: String,

        #[arg(short = 'k', long, default_value_t = 10)]
        top_k: usize,

        #[arg(short, long, default_value_t = 0.0)]
        min_similarity: f32,

        #[arg(long, default_value = "normal", value_parser = parse_level)]
        spiciness: PreferenceLevel,

        #[arg(long, default_value = "normal", value_parser = parse_level)]
        saltiness: PreferenceLevel,
    },
}

fn parse_level(raw: &str) -> Result<PreferenceLevel, RecipeError> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        let cli = Cli::try_parse_from(["recipe-pipeline", "search", "소고기 요리"]).unwrap();
        match cli.command {
            Commands::Search {
                query,
                top_k,
                min_similarity,
                spiciness,
                saltiness,
            } => {
                assert_eq!(query, "소고기 요리");
                assert_eq!(top_k, 10);
                assert_eq!(min_similarity, 0.0);
                assert_eq!(spiciness, PreferenceLevel::Normal);
                assert_eq!(saltiness, PreferenceLevel::Normal);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_preferences() {
        let cli = Cli::try_parse_from([
            "recipe-pipeline",
            "search",
            "두부",
            "-k",
            "3",
            "--spiciness",
            "more",
            "--saltiness",
            "적게",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Search {
                top_k: 3,
                spiciness: PreferenceLevel::More,
                saltiness: PreferenceLevel::Less,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_preference() {
        let result =
            Cli::try_parse_from(["recipe-pipeline", "search", "두부", "--spiciness", "volcanic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_translate_requires_paths() {
        assert!(Cli::try_parse_from(["recipe-pipeline", "translate", "-i", "in.json"]).is_err());

        let cli = Cli::try_parse_from([
            "recipe-pipeline",
            "translate",
            "-i",
            "in.json",
            "-o",
            "out.json",
            "--repair",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Translate { repair: true, .. }));
    }
}
