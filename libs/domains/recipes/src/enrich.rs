use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecipeError;

/// Korean keywords and the English terms appended when a query mentions them.
const SYNONYMS: &[(&str, &str)] = &[
    ("소고기", "beef beef meat beef recipe"),
    ("돼지고기", "pork pork meat pork recipe"),
    ("닭고기", "chicken chicken meat chicken recipe"),
    ("생선", "fish seafood fish recipe"),
    ("새우", "shrimp seafood shrimp recipe"),
    ("연어", "salmon fish seafood salmon recipe"),
    ("오징어", "squid seafood squid recipe"),
    ("두부", "tofu tofu recipe"),
    ("버섯", "mushroom mushroom recipe"),
    ("파스타", "pasta pasta recipe"),
    ("볶음밥", "fried rice fried rice recipe"),
    ("떡볶이", "rice cake rice cake recipe"),
    ("볶음", "stir-fry stir fry recipe"),
    ("구이", "grilled grill recipe"),
    ("조림", "braised braised recipe"),
    ("찜", "steamed steam recipe"),
    ("국", "soup soup recipe"),
    ("찌개", "stew stew recipe"),
    ("전", "pancake pancake recipe"),
    ("무침", "salad salad recipe"),
];

/// A taste preference on a three-step scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceLevel {
    Less,
    #[default]
    Normal,
    More,
}

impl PreferenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceLevel::Less => "less",
            PreferenceLevel::Normal => "normal",
            PreferenceLevel::More => "more",
        }
    }
}

impl fmt::Display for PreferenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceLevel {
    type Err = RecipeError;

    /// Accepts the level names plus common English and Korean synonyms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "less" | "low" | "mild" | "적게" | "덜" => Ok(PreferenceLevel::Less),
            "normal" | "medium" | "보통" => Ok(PreferenceLevel::Normal),
            "more" | "high" | "extra" | "많이" | "더" => Ok(PreferenceLevel::More),
            other => Err(RecipeError::Validation(format!(
                "Unknown preference level '{}', expected less, normal or more",
                other
            ))),
        }
    }
}

/// Stated taste preferences attached to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub spiciness: PreferenceLevel,
    #[serde(default)]
    pub saltiness: PreferenceLevel,
}

impl Preferences {
    pub fn new(spiciness: PreferenceLevel, saltiness: PreferenceLevel) -> Self {
        Self {
            spiciness,
            saltiness,
        }
    }

    fn clause(&self) -> String {
        format!(
            "Preferences: spiciness={}, saltiness={}.",
            self.spiciness, self.saltiness
        )
    }
}

/// Widens a user query with English synonyms before it is embedded.
#[derive(Debug, Clone)]
pub struct QueryEnricher {
    synonyms: Vec<(String, String)>,
}

impl Default for QueryEnricher {
    fn default() -> Self {
        Self {
            synonyms: SYNONYMS
                .iter()
                .map(|(ko, en)| (ko.to_string(), en.to_string()))
                .collect(),
        }
    }
}

impl QueryEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry after the built-in table.
    pub fn with_synonym(mut self, korean: impl Into<String>, english: impl Into<String>) -> Self {
        self.synonyms.push((korean.into(), english.into()));
        self
    }

    /// Expand `text`: every table key found in it appends its English
    /// terms, in table order, and a preference clause closes the result.
    pub fn enrich(&self, text: &str, preferences: &Preferences) -> String {
        let mut enriched = text.to_string();
        for (korean, english) in &self.synonyms {
            if text.contains(korean.as_str()) {
                enriched.push(' ');
                enriched.push_str(english);
            }
        }
        enriched.push('\n');
        enriched.push_str(&preferences.clause());
        enriched
    }
}
