//! Recipe normalization
//!
//! Deterministic mapping from a source record onto [`NewRecipe`]. Nothing in
//! here does I/O; the importer feeds it the fetched records and options.

use once_cell::sync::Lazy;
use regex::Regex;

use super::recipe_source::{InstructionBlock, SourceIngredient, SourceNutrient, SourceRecipe};
use crate::models::{
    CategoryRef, Difficulty, NewDirection, NewIngredient, NewRecipe, NutritionFacts,
};

/// Share of total time attributed to preparation
const PREP_SHARE: f64 = 0.30;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

const ENTITIES: [(&str, &str); 7] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    // Last, so "&amp;lt;" decodes to the literal text "&lt;"
    ("&amp;", "&"),
];

/// Per-import normalization settings
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub category: CategoryRef,
    pub youtube_id: Option<String>,
    pub summary_max_chars: usize,
    pub default_servings: u32,
    /// Used when the record carries no source name of its own
    pub source_name: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            category: CategoryRef::general(),
            youtube_id: None,
            summary_max_chars: 200,
            default_servings: 4,
            source_name: "Spoonacular".to_string(),
        }
    }
}

/// Remove tags, decode common entities, collapse whitespace
pub fn strip_html(html: &str) -> String {
    let mut text = TAG.replace_all(html, "").into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to `max_chars` characters, appending `...` only when cut
pub fn summarize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// Split a total time into (prep, cook); the two always sum to `total`
pub fn estimate_prep_cook(total_minutes: u32) -> (u32, u32) {
    let prep = (total_minutes as f64 * PREP_SHARE).round() as u32;
    (prep, total_minutes - prep)
}

/// Case-insensitive nutrient lookup
pub fn nutrient_value(nutrients: &[SourceNutrient], name: &str) -> Option<f64> {
    nutrients
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(name))
        .map(|n| n.amount)
}

/// Render an ingredient amount: whole numbers without a fraction, others to
/// at most two decimals
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() || amount <= 0.0 {
        return String::new();
    }
    if amount.fract() == 0.0 {
        return format!("{}", amount as i64);
    }
    let rounded = format!("{:.2}", amount);
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Category for a bulk import, derived from its tag string
pub fn category_from_tags(tags: &str) -> CategoryRef {
    let tags = tags.to_lowercase();
    let has = |needle: &str| tags.contains(needle);

    let name = if has("breakfast") {
        "Breakfast"
    } else if has("lunch") {
        "Lunch"
    } else if has("dinner") || has("main") {
        "Dinner"
    } else if has("dessert") {
        "Desserts"
    } else if has("appetizer") {
        "Appetizers"
    } else if has("snack") {
        "Snacks"
    } else if has("italian") {
        "Italian"
    } else if has("mexican") {
        "Mexican"
    } else if has("asian") || has("chinese") || has("japanese") || has("thai") {
        "Asian"
    } else if has("mediterranean") {
        "Mediterranean"
    } else if has("american") {
        "American"
    } else if has("indian") {
        "Indian"
    } else {
        "General"
    };

    CategoryRef::new(name)
}

fn normalize_nutrition(recipe: &SourceRecipe) -> Option<NutritionFacts> {
    let nutrients = &recipe.nutrition.as_ref()?.nutrients;
    if nutrients.is_empty() {
        return None;
    }

    Some(NutritionFacts {
        calories: nutrient_value(nutrients, "Calories").unwrap_or(0.0).round() as i64,
        protein: nutrient_value(nutrients, "Protein").unwrap_or(0.0),
        carbs: nutrient_value(nutrients, "Carbohydrates").unwrap_or(0.0),
        fat: nutrient_value(nutrients, "Fat").unwrap_or(0.0),
        fiber: nutrient_value(nutrients, "Fiber"),
        sugar: nutrient_value(nutrients, "Sugar"),
        sodium: nutrient_value(nutrients, "Sodium").map(|v| v.round() as i64),
    })
}

fn normalize_ingredient(ingredient: &SourceIngredient) -> NewIngredient {
    let amount = format_amount(ingredient.amount);
    let unit = Some(ingredient.unit.trim().to_string()).filter(|u| !u.is_empty());
    let name = ingredient.name.trim().to_string();

    let original = if ingredient.original.trim().is_empty() {
        [amount.as_str(), unit.as_deref().unwrap_or(""), name.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        ingredient.original.trim().to_string()
    };

    let nutrients = ingredient
        .nutrition
        .as_ref()
        .map(|n| n.nutrients.as_slice())
        .unwrap_or(&[]);

    NewIngredient {
        amount,
        unit,
        name,
        original,
        calories: nutrient_value(nutrients, "Calories"),
        protein: nutrient_value(nutrients, "Protein"),
        carbs: nutrient_value(nutrients, "Carbohydrates"),
        fat: nutrient_value(nutrients, "Fat"),
    }
}

/// Directions from the first instruction block that has steps
///
/// Steps are renumbered 1..n in source order and blank steps dropped.
pub fn directions_from_blocks(blocks: &[InstructionBlock]) -> Vec<NewDirection> {
    let Some(block) = blocks.iter().find(|b| b.steps.iter().any(|s| !s.step.trim().is_empty()))
    else {
        return Vec::new();
    };

    block
        .steps
        .iter()
        .filter(|s| !s.step.trim().is_empty())
        .enumerate()
        .map(|(idx, s)| NewDirection {
            step_number: idx as u32 + 1,
            instruction: s.step.trim().to_string(),
            image_url: s.image.clone().filter(|i| !i.is_empty()),
        })
        .collect()
}

/// Map a source record onto a new recipe tree
///
/// `instructions` is the separately fetched analyzed-instruction list; when it
/// is empty the record's own `analyzedInstructions` are used instead.
pub fn normalize(
    recipe: &SourceRecipe,
    instructions: &[InstructionBlock],
    options: &NormalizeOptions,
) -> NewRecipe {
    let description = strip_html(recipe.summary.as_deref().unwrap_or(""));
    let summary = summarize(&description, options.summary_max_chars);

    let total_time = recipe.ready_in_minutes.unwrap_or(0);
    let (prep_time, cook_time) = estimate_prep_cook(total_time);

    let mut directions = directions_from_blocks(instructions);
    if directions.is_empty() {
        directions = directions_from_blocks(&recipe.analyzed_instructions);
    }

    let servings = recipe
        .servings
        .filter(|s| *s > 0)
        .unwrap_or(options.default_servings);

    NewRecipe {
        source_id: Some(recipe.id),
        title: recipe.title.trim().to_string(),
        description,
        summary,
        prep_time,
        cook_time,
        total_time,
        servings,
        difficulty: Difficulty::from_total_minutes(total_time),
        image_url: recipe.image.clone().filter(|i| !i.is_empty()),
        youtube_id: options.youtube_id.clone(),
        source_url: recipe.source_url.clone().filter(|u| !u.is_empty()),
        source_name: Some(
            recipe
                .source_name
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| options.source_name.clone()),
        ),
        category: options.category.clone(),
        ingredients: recipe.extended_ingredients.iter().map(normalize_ingredient).collect(),
        directions,
        nutrition: normalize_nutrition(recipe),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::recipe_source::{InstructionStep, SourceNutrition};

    fn nutrient(name: &str, amount: f64) -> SourceNutrient {
        SourceNutrient {
            name: name.to_string(),
            amount,
            unit: String::new(),
        }
    }

    fn block(steps: &[&str]) -> InstructionBlock {
        InstructionBlock {
            name: String::new(),
            steps: steps
                .iter()
                .enumerate()
                .map(|(i, s)| InstructionStep {
                    number: i as u32 + 1,
                    step: s.to_string(),
                    image: None,
                })
                .collect(),
        }
    }

    fn sample() -> SourceRecipe {
        SourceRecipe {
            id: 716429,
            title: "Pasta with Garlic, Scallions, Cauliflower & Breadcrumbs".to_string(),
            image: Some("https://img.test/716429.jpg".to_string()),
            summary: Some("<b>Tasty</b> pasta &amp; greens".to_string()),
            ready_in_minutes: Some(45),
            servings: Some(2),
            source_url: Some("https://example.com/pasta".to_string()),
            source_name: None,
            nutrition: Some(SourceNutrition {
                nutrients: vec![
                    nutrient("Calories", 543.36),
                    nutrient("protein", 16.84),
                    nutrient("Sodium", 390.2),
                ],
            }),
            extended_ingredients: vec![
                SourceIngredient {
                    name: "butter".to_string(),
                    amount: 1.0,
                    unit: "tbsp".to_string(),
                    original: "1 tbsp butter".to_string(),
                    ..Default::default()
                },
                SourceIngredient {
                    name: "cauliflower florets".to_string(),
                    amount: 0.333333,
                    unit: String::new(),
                    original: String::new(),
                    ..Default::default()
                },
            ],
            analyzed_instructions: vec![block(&["From the record."])],
        }
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Hello&nbsp;<b>world</b> &amp; &quot;friends&quot;</p>\n\n  "),
            "Hello world & \"friends\""
        );
        assert_eq!(strip_html("a &lt;b&gt; c &#39;d&#39;"), "a <b> c 'd'");
        assert_eq!(strip_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("short", 200), "short");
        let long = "x".repeat(250);
        let summary = summarize(&long, 200);
        assert_eq!(summary.len(), 203);
        assert!(summary.ends_with("..."));
        // Multi-byte characters are never split
        let accented = "é".repeat(10);
        assert_eq!(summarize(&accented, 3), "ééé...");
    }

    #[test]
    fn test_prep_cook_sum_to_total() {
        for total in 0..=500 {
            let (prep, cook) = estimate_prep_cook(total);
            assert_eq!(prep + cook, total);
        }
        assert_eq!(estimate_prep_cook(45), (14, 31));
        assert_eq!(estimate_prep_cook(0), (0, 0));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(0.333333), "0.33");
        assert_eq!(format_amount(1.999), "2");
        assert_eq!(format_amount(0.0), "");
    }

    #[test]
    fn test_category_from_tags() {
        assert_eq!(category_from_tags("Dessert,chocolate").name, "Desserts");
        assert_eq!(category_from_tags("main course").name, "Dinner");
        assert_eq!(category_from_tags("thai").name, "Asian");
        assert_eq!(category_from_tags("vegan").name, "General");
        assert_eq!(category_from_tags("breakfast,dessert").name, "Breakfast");
    }

    #[test]
    fn test_normalize_sample() {
        let recipe = normalize(&sample(), &[block(&["Boil pasta.", "  ", "Toss."])], &NormalizeOptions::default());

        assert_eq!(recipe.source_id, Some(716429));
        assert_eq!(recipe.description, "Tasty pasta & greens");
        assert_eq!(recipe.summary, "Tasty pasta & greens");
        assert_eq!((recipe.prep_time, recipe.cook_time, recipe.total_time), (14, 31, 45));
        assert_eq!(recipe.difficulty, Difficulty::Medium);
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.source_name.as_deref(), Some("Spoonacular"));
        assert_eq!(recipe.category.slug, "general");

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("tbsp"));
        assert_eq!(recipe.ingredients[1].unit, None);
        assert_eq!(recipe.ingredients[1].original, "0.33 cauliflower florets");

        let steps: Vec<_> = recipe.directions.iter().map(|d| (d.step_number, d.instruction.as_str())).collect();
        assert_eq!(steps, vec![(1, "Boil pasta."), (2, "Toss.")]);

        let nutrition = recipe.nutrition.unwrap();
        assert_eq!(nutrition.calories, 543);
        assert_eq!(nutrition.protein, 16.84);
        assert_eq!(nutrition.carbs, 0.0);
        assert_eq!(nutrition.fiber, None);
        assert_eq!(nutrition.sodium, Some(390));
    }

    #[test]
    fn test_directions_fall_back_to_record() {
        let recipe = normalize(&sample(), &[], &NormalizeOptions::default());
        assert_eq!(recipe.directions.len(), 1);
        assert_eq!(recipe.directions[0].instruction, "From the record.");
    }

    #[test]
    fn test_sparse_record() {
        let sparse = SourceRecipe {
            id: 1,
            title: "Toast".to_string(),
            ..Default::default()
        };
        let recipe = normalize(&sparse, &[], &NormalizeOptions::default());

        assert_eq!((recipe.prep_time, recipe.cook_time), (0, 0));
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert_eq!(recipe.servings, 4);
        assert!(recipe.directions.is_empty());
        assert!(recipe.nutrition.is_none());
        assert_eq!(recipe.summary, "");
    }
}
