//! AI direction generation
//!
//! Synthesizes cooking steps when a source recipe has none. Model output is
//! treated as untrusted text: the outermost JSON array is extracted and
//! parsed, and a numbered list is accepted when the JSON is unusable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use super::llm::{ChatMessage, CompletionOptions, LlmError, LlmProvider};
use crate::models::{NewDirection, NewIngredient};

const DEFAULT_SERVINGS: u32 = 4;

/// Direction generation runs on a cheaper model than chat when on OpenRouter
const OPENROUTER_DIRECTIONS_MODEL: &str = "openai/gpt-3.5-turbo";

/// Model for direction generation when none is configured
pub fn default_directions_model(provider_name: &str) -> Option<String> {
    match provider_name {
        "openrouter" => Some(OPENROUTER_DIRECTIONS_MODEL.to_string()),
        _ => None,
    }
}

static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:step\s*)?(\d{1,2})\s*[.):\-]\s*(.+?)\s*$").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum DirectionError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("No directions found in model output: {0}")]
    Unparseable(String),
}

/// Ingredient line as it appears in the prompt
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct IngredientLine {
    #[serde(default, deserialize_with = "amount_as_string")]
    pub amount: String,
    #[serde(default)]
    pub unit: Option<String>,
    pub name: String,
}

/// Accept `"amount": 2` as well as `"amount": "2"`
fn amount_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl From<&NewIngredient> for IngredientLine {
    fn from(ingredient: &NewIngredient) -> Self {
        Self {
            amount: ingredient.amount.clone(),
            unit: ingredient.unit.clone(),
            name: ingredient.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectionRequest {
    pub title: String,
    pub servings: Option<u32>,
    pub ingredients: Vec<IngredientLine>,
}

#[derive(Debug, Clone)]
pub struct DirectionGenerator {
    provider: Arc<dyn LlmProvider>,
    /// Overrides the provider's default model
    model: Option<String>,
}

impl DirectionGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Option<String>) -> Self {
        Self { provider, model }
    }

    pub fn build_prompt(request: &DirectionRequest) -> String {
        let ingredients = if request.ingredients.is_empty() {
            "Standard ingredients for this recipe".to_string()
        } else {
            request
                .ingredients
                .iter()
                .map(|ing| {
                    let line = format!(
                        "- {} {} {}",
                        ing.amount,
                        ing.unit.as_deref().unwrap_or(""),
                        ing.name
                    );
                    line.split_whitespace().collect::<Vec<_>>().join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"You are a professional chef writing clear, detailed cooking instructions.

Recipe: {title}
Servings: {servings}

Ingredients:
{ingredients}

Generate a complete, step-by-step cooking instruction guide. Return ONLY a JSON array of direction steps.

Each step should have:
- stepNumber: number (starting from 1)
- instruction: string (detailed, clear instruction)

Format:
[
  {{"stepNumber": 1, "instruction": "Preheat oven to 350°F (175°C)."}},
  {{"stepNumber": 2, "instruction": "In a large bowl, combine..."}}
]

Requirements:
- 5-12 steps (appropriate for the recipe)
- Clear, actionable instructions
- Include temperatures, times, and techniques
- NO markdown, ONLY JSON array

Generate now:"#,
            title = request.title.trim(),
            servings = request.servings.filter(|s| *s > 0).unwrap_or(DEFAULT_SERVINGS),
            ingredients = ingredients,
        )
    }

    /// Ask the model for directions and parse them
    pub async fn generate(&self, request: &DirectionRequest) -> Result<Vec<NewDirection>, DirectionError> {
        let prompt = Self::build_prompt(request);
        let options = CompletionOptions {
            model: self.model.clone(),
            temperature: 0.7,
            max_tokens: 400,
            ..CompletionOptions::default()
        };

        let completion = self
            .provider
            .chat(&[ChatMessage::user(prompt)], &options)
            .await?;

        let directions = parse_directions(&completion.content)?;

        tracing::info!(
            title = %request.title,
            steps = directions.len(),
            model = %completion.model,
            "Generated directions"
        );

        Ok(directions)
    }
}

/// Parse model output into renumbered directions
pub fn parse_directions(content: &str) -> Result<Vec<NewDirection>, DirectionError> {
    let instructions = parse_json_array(content)
        .filter(|steps| !steps.is_empty())
        .unwrap_or_else(|| parse_numbered_list(content));

    let directions: Vec<NewDirection> = instructions
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(idx, instruction)| NewDirection {
            step_number: idx as u32 + 1,
            instruction,
            image_url: None,
        })
        .collect();

    if directions.is_empty() {
        let excerpt: String = content.chars().take(200).collect();
        return Err(DirectionError::Unparseable(excerpt));
    }

    Ok(directions)
}

/// Instructions from the outermost `[...]` span, if it parses
fn parse_json_array(content: &str) -> Option<Vec<String>> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    if end <= start {
        return None;
    }

    let cleaned: String = content[start..=end]
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let items: Vec<Value> = serde_json::from_str(&cleaned).ok()?;

    let steps = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            Value::Object(map) => ["instruction", "step", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string)),
            _ => None,
        })
        .collect();

    Some(steps)
}

/// Instructions from lines like `1. ...`, `2) ...`, `Step 3: ...`
fn parse_numbered_list(content: &str) -> Vec<String> {
    NUMBERED_LINE
        .captures_iter(content)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::FakeProvider;

    #[test]
    fn test_default_directions_model() {
        assert_eq!(default_directions_model("openrouter").as_deref(), Some("openai/gpt-3.5-turbo"));
        assert_eq!(default_directions_model("groq"), None);
    }

    #[test]
    fn test_prompt_contents() {
        let request = DirectionRequest {
            title: "Garlic Pasta".to_string(),
            servings: None,
            ingredients: vec![
                IngredientLine {
                    amount: "200".into(),
                    unit: Some("g".into()),
                    name: "spaghetti".into(),
                },
                IngredientLine {
                    amount: "3".into(),
                    unit: None,
                    name: "garlic cloves".into(),
                },
            ],
        };
        let prompt = DirectionGenerator::build_prompt(&request);
        assert!(prompt.contains("Recipe: Garlic Pasta"));
        assert!(prompt.contains("Servings: 4"));
        assert!(prompt.contains("- 200 g spaghetti\n- 3 garlic cloves"));
        assert!(prompt.contains(r#"{"stepNumber": 1,"#));
    }

    #[test]
    fn test_prompt_without_ingredients() {
        let prompt = DirectionGenerator::build_prompt(&DirectionRequest {
            title: "Mystery Stew".into(),
            servings: Some(6),
            ingredients: vec![],
        });
        assert!(prompt.contains("Servings: 6"));
        assert!(prompt.contains("Standard ingredients for this recipe"));
    }

    #[test]
    fn test_parse_clean_json() {
        let steps = parse_directions(
            r#"[{"stepNumber": 1, "instruction": "Boil water."}, {"stepNumber": 2, "instruction": "Add pasta."}]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(steps[1].instruction, "Add pasta.");
    }

    #[test]
    fn test_parse_json_wrapped_in_prose_and_fences() {
        let content = "Sure! Here you go:\n```json\n[\n  {\"stepNumber\": 3, \"instruction\": \"Chop onions.\"},\n  {\"stepNumber\": 7, \"instruction\": \"Fry.\"}\n]\n```\nEnjoy!";
        let steps = parse_directions(content).unwrap();
        let numbers: Vec<u32> = steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(steps[0].instruction, "Chop onions.");
    }

    #[test]
    fn test_parse_json_with_raw_control_characters() {
        let content = "[{\"stepNumber\": 1, \"instruction\": \"Whisk\teggs\nuntil fluffy.\"}]";
        let steps = parse_directions(content).unwrap();
        assert_eq!(steps[0].instruction, "Whisk eggs until fluffy.");
    }

    #[test]
    fn test_parse_numbered_list_fallback() {
        let content = "Here are the steps:\n1. Preheat oven.\n2) Mix flour.\nStep 3: Bake 20 minutes.\nServe warm.";
        let steps = parse_directions(content).unwrap();
        let text: Vec<&str> = steps.iter().map(|s| s.instruction.as_str()).collect();
        assert_eq!(text, vec!["Preheat oven.", "Mix flour.", "Bake 20 minutes."]);
    }

    #[test]
    fn test_parse_drops_blank_steps() {
        let steps = parse_directions(r#"["Stir.", "  ", {"instruction": ""}, {"step": "Serve."}]"#).unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(steps[1].instruction, "Serve.");
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(
            parse_directions("I cannot help with that."),
            Err(DirectionError::Unparseable(_))
        ));
        assert!(parse_directions("[]").is_err());
    }

    #[test]
    fn test_ingredient_line_accepts_numeric_amount() {
        let line: IngredientLine = serde_json::from_str(r#"{"amount": 2, "unit": "cups", "name": "flour"}"#).unwrap();
        assert_eq!(line.amount, "2");
        let line: IngredientLine = serde_json::from_str(r#"{"name": "salt"}"#).unwrap();
        assert_eq!(line.amount, "");
    }

    #[tokio::test]
    async fn test_generate_uses_provider() {
        let provider = Arc::new(
            FakeProvider::new().with_response("Recipe: Toast", r#"[{"stepNumber":1,"instruction":"Toast bread."}]"#),
        );
        let generator = DirectionGenerator::new(provider.clone(), None);

        let steps = generator
            .generate(&DirectionRequest {
                title: "Toast".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(steps[0].instruction, "Toast bread.");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_propagates_provider_failure() {
        let generator = DirectionGenerator::new(Arc::new(FakeProvider::failing(500)), None);
        let result = generator.generate(&DirectionRequest::default()).await;
        assert!(matches!(result, Err(DirectionError::Llm(_))));
    }
}
