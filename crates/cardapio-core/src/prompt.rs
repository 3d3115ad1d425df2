//! Prompt construction for the three request intents.
//!
//! Pure string building: the same inputs always render the same prompt.

use crate::locale::DayLocale;

/// Staples the ingredient-constrained plan may use when extras are allowed.
pub const PANTRY_STAPLES: [&str; 4] = ["salt", "oil", "garlic", "onion"];

/// Marker rendered in place of an empty ingredient list.
pub const NO_INGREDIENTS: &str = "none";

/// Field description of one recipe object, keyed in `locale`'s spelling.
fn recipe_shape(locale: DayLocale) -> String {
    let [name, ingredients, preparation] = locale.recipe_keys();
    format!(
        r#"{{"{name}": string, "{ingredients}": [list of ingredient strings], "{preparation}": string}}"#
    )
}

/// A placeholder recipe object for the plan example.
fn recipe_example(locale: DayLocale) -> String {
    let [name, ingredients, preparation] = locale.recipe_keys();
    format!(r#"{{"{name}": "...", "{ingredients}": ["..."], "{preparation}": "..."}}"#)
}

const JSON_ONLY: &str = "Respond ONLY with valid JSON, without any additional text.";

/// Prompt for `count` standalone recipes, returned as a JSON array.
pub fn recipe_batch_prompt(count: usize, locale: DayLocale) -> String {
    let mut prompt = String::with_capacity(512);
    prompt.push_str(&format!(
        "Create {count} varied recipes in JSON format. \
         Reply with a JSON array of objects, each with the fields: {}.\n",
        recipe_shape(locale)
    ));
    prompt.push_str(
        "The recipes must be simple, varied and realistic, ideal for a weekly menu \
         with lunch and dinner every day.\n",
    );
    prompt.push_str(JSON_ONLY);
    prompt.push('\n');
    prompt
}

/// Prompt asking the model to assign previously generated recipes, by name,
/// to the lunch and dinner of every day.
pub fn selection_prompt(recipe_names: &[String], locale: DayLocale) -> String {
    let days = locale.day_names();
    let names = serde_json::to_string(recipe_names).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::with_capacity(1024);
    prompt.push_str(
        "Select 2 different meals for each day of the week, lunch first and dinner second, \
         from the recipes provided.\n",
    );
    prompt.push_str(&format!(
        "Use the JSON format: {{\"{}\": [\"<lunch recipe>\", \"<dinner recipe>\"], ...}}\n",
        days[0]
    ));
    prompt.push_str(&format!("Use exactly these day keys: {}.\n", days.join(", ")));
    prompt.push_str("Choose only names of the recipes provided, spelled exactly as given.\n");
    prompt.push_str(JSON_ONLY);
    prompt.push('\n');
    prompt.push_str(&format!("Available recipes: {names}\n"));
    prompt
}

/// Render an ingredient list for a prompt: comma-joined, or [`NO_INGREDIENTS`].
pub fn render_ingredients(ingredients: &[String]) -> String {
    if ingredients.is_empty() {
        NO_INGREDIENTS.to_string()
    } else {
        ingredients.join(", ")
    }
}

/// Prompt for a full seven-day plan built from the supplied ingredients,
/// with two embedded recipes per day.
pub fn ingredient_plan_prompt(
    ingredients: &[String],
    allow_extras: bool,
    locale: DayLocale,
) -> String {
    let days = locale.day_names();
    let extras = if allow_extras {
        format!(
            "You may use basic staples such as {} if needed.",
            PANTRY_STAPLES.join(", ")
        )
    } else {
        "Use only the listed ingredients, adapting the recipes if needed.".to_string()
    };

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(&format!(
        "You are a creative chef. Using ONLY the ingredients provided, create a weekly menu \
         ({} to {}) with two meals per day: lunch and dinner.\n\n",
        days[0], days[6]
    ));

    prompt.push_str("Mandatory response format:\n");
    prompt.push_str("{\n");
    let example = recipe_example(locale);
    prompt.push_str(&format!("  \"{}\": [ {example}, {example} ],\n", days[0]));
    prompt.push_str(&format!(
        "  \"{}\": [...], \"{}\": [...], ...\n",
        days[1], days[2]
    ));
    prompt.push_str("}\n\n");

    prompt.push_str("Rules:\n");
    prompt.push_str(&format!(" - Use exactly these day keys: {}.\n", days.join(", ")));
    let [name, ingredients_key, preparation] = locale.recipe_keys();
    prompt.push_str(&format!(
        " - Each meal must have \"{name}\", \"{ingredients_key}\" (a list) and a short \"{preparation}\".\n"
    ));
    prompt.push_str(" - The recipes must be simple, homemade and varied.\n");
    prompt.push_str(&format!(
        " - Available ingredients: {}.\n",
        render_ingredients(ingredients)
    ));
    prompt.push_str(&format!(" - {extras}\n"));
    prompt.push_str(&format!(" - {JSON_ONLY}\n"));
    prompt
}
