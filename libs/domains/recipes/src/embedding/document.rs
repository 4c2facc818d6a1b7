use crate::models::TranslatedRecipe;

/// Flatten a recipe's English fields into the text that gets embedded.
///
/// Empty sections are omitted; a recipe with no English content yields an
/// empty string, which embeds to the zero vector.
pub fn recipe_document(recipe: &TranslatedRecipe) -> String {
    let mut parts = Vec::new();

    if !recipe.title_en.is_empty() {
        parts.push(format!("Title: {}", recipe.title_en));
    }
    if !recipe.description_en.is_empty() {
        parts.push(format!("Description: {}", recipe.description_en));
    }

    let ingredients: Vec<&str> = non_empty(&recipe.ingredients_en).collect();
    if !ingredients.is_empty() {
        parts.push(format!("Ingredients: {}", ingredients.join(", ")));
    }

    let steps: Vec<&str> = non_empty(&recipe.cooking_steps_en).collect();
    if !steps.is_empty() {
        parts.push(format!("Cooking Steps: {}", steps.join(" ")));
    }

    parts.join("\n")
}

fn non_empty(items: &[String]) -> impl Iterator<Item = &str> {
    items.iter().map(String::as_str).filter(|s| !s.is_empty())
}
