use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{Recipe, TranslatedRecipe};

/// True when `text` contains at least one Hangul syllable.
pub fn needs_translation(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}

/// Which field of a recipe a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitTag {
    Title,
    Description,
    Ingredient(usize),
    Step(usize),
}

/// One fragment of a recipe awaiting translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationUnit<'a> {
    pub recipe_id: Uuid,
    pub tag: UnitTag,
    pub text: &'a str,
}

/// Flatten a recipe into the fragments that contain Korean text.
pub fn translation_units(recipe: &Recipe) -> Vec<TranslationUnit<'_>> {
    let recipe_id = recipe.id();

    let fields = [
        (UnitTag::Title, recipe.title.as_str()),
        (UnitTag::Description, recipe.description.as_str()),
    ]
    .into_iter()
    .chain(
        recipe
            .ingredients
            .iter()
            .enumerate()
            .map(|(i, text)| (UnitTag::Ingredient(i), text.as_str())),
    )
    .chain(
        recipe
            .cooking_steps
            .iter()
            .enumerate()
            .map(|(i, step)| (UnitTag::Step(i), step.text.as_str())),
    );

    fields
        .filter(|(_, text)| needs_translation(text))
        .map(|(tag, text)| TranslationUnit {
            recipe_id,
            tag,
            text,
        })
        .collect()
}

/// The English text currently held for `tag`, if the slot exists.
pub(crate) fn english_for(translated: &TranslatedRecipe, tag: UnitTag) -> Option<&str> {
    match tag {
        UnitTag::Title => Some(translated.title_en.as_str()),
        UnitTag::Description => Some(translated.description_en.as_str()),
        UnitTag::Ingredient(i) => translated.ingredients_en.get(i).map(String::as_str),
        UnitTag::Step(i) => translated.cooking_steps_en.get(i).map(String::as_str),
    }
}

/// Write `value` into the slot named by `tag`.
pub(crate) fn place(translated: &mut TranslatedRecipe, tag: UnitTag, value: String) {
    match tag {
        UnitTag::Title => translated.title_en = value,
        UnitTag::Description => translated.description_en = value,
        UnitTag::Ingredient(i) => {
            if let Some(slot) = translated.ingredients_en.get_mut(i) {
                *slot = value;
            }
        }
        UnitTag::Step(i) => {
            if let Some(slot) = translated.cooking_steps_en.get_mut(i) {
                *slot = value;
            }
        }
    }
}

/// Build the English rendering of `recipe`.
///
/// Each unit's translation lands at its own tag index. Units without an
/// entry in `translations` (failed calls) and fields with no Korean keep
/// their source text.
pub fn assemble(recipe: Recipe, translations: &HashMap<String, String>) -> TranslatedRecipe {
    let placements: Vec<(UnitTag, String)> = translation_units(&recipe)
        .into_iter()
        .filter_map(|unit| {
            translations
                .get(unit.text)
                .map(|translated| (unit.tag, translated.clone()))
        })
        .collect();

    let mut translated = TranslatedRecipe::untranslated(recipe);
    for (tag, value) in placements {
        place(&mut translated, tag, value);
    }
    translated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe::new("https://example.com/recipe/7", "소고기 볶음")
            .with_description("Quick beef")
            .with_ingredients(["소고기 200g", "2 tbsp oil", "간장 1큰술"])
            .with_steps(["소고기를 볶는다", "간장 1큰술"])
    }

    #[test]
    fn test_needs_translation() {
        assert!(needs_translation("소금 1g"));
        assert!(needs_translation("1 tbsp 간장"));
        assert!(!needs_translation("1 tbsp soy sauce"));
        assert!(!needs_translation(""));
        // Hangul compatibility jamo are not syllables
        assert!(!needs_translation("ㅋㅋ"));
    }

    #[test]
    fn test_units_skip_text_without_korean() {
        let recipe = recipe();
        let units = translation_units(&recipe);
        let tags: Vec<UnitTag> = units.iter().map(|u| u.tag).collect();

        assert_eq!(
            tags,
            vec![
                UnitTag::Title,
                UnitTag::Ingredient(0),
                UnitTag::Ingredient(2),
                UnitTag::Step(0),
                UnitTag::Step(1),
            ]
        );
        assert!(units.iter().all(|u| u.recipe_id == recipe.id()));
    }

    #[test]
    fn test_assemble_places_by_index() {
        let translations = HashMap::from([
            ("소고기 볶음".to_string(), "Stir-fried beef".to_string()),
            ("소고기 200g".to_string(), "200g beef".to_string()),
            ("간장 1큰술".to_string(), "1 tbsp soy sauce".to_string()),
        ]);

        let translated = assemble(recipe(), &translations);

        assert_eq!(translated.title_en, "Stir-fried beef");
        assert_eq!(translated.description_en, "Quick beef");
        assert_eq!(
            translated.ingredients_en,
            vec!["200g beef", "2 tbsp oil", "1 tbsp soy sauce"]
        );
        // step 0 failed: falls back to source; step 1 shares the ingredient's text
        assert_eq!(
            translated.cooking_steps_en,
            vec!["소고기를 볶는다", "1 tbsp soy sauce"]
        );
    }
}
