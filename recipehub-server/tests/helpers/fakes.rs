//! In-process stand-ins for the recipe source and video search APIs

use async_trait::async_trait;
use recipehub_server::services::recipe_source::{
    InstructionBlock, InstructionStep, SearchHit, SearchResults, SourceIngredient, SourceNutrient,
    SourceNutrition, SourceRecipe,
};
use recipehub_server::services::{RecipeSource, SourceError, VideoSearch};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Recipe source serving canned records
#[derive(Debug, Default)]
pub struct FakeRecipeSource {
    records: BTreeMap<i64, SourceRecipe>,
    instructions: BTreeMap<i64, Vec<InstructionBlock>>,
    /// Ids whose detail fetch fails
    broken: Vec<i64>,
    requests: Mutex<Vec<String>>,
}

impl FakeRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record with the given steps (none means "no instructions")
    pub fn with_recipe(mut self, record: SourceRecipe, steps: &[&str]) -> Self {
        if !steps.is_empty() {
            self.instructions.insert(record.id, vec![block(steps)]);
        }
        self.records.insert(record.id, record);
        self
    }

    pub fn with_broken(mut self, id: i64) -> Self {
        self.broken.push(id);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(&self, what: String) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(what);
        }
    }
}

#[async_trait]
impl RecipeSource for FakeRecipeSource {
    async fn search(&self, query: &str, number: u32) -> Result<SearchResults, SourceError> {
        self.record(format!("search:{}", query));
        let query = query.to_lowercase();
        let results: Vec<SearchHit> = self
            .records
            .values()
            .filter(|r| r.title.to_lowercase().contains(&query))
            .take(number as usize)
            .map(|r| SearchHit {
                id: r.id,
                title: r.title.clone(),
                image: r.image.clone(),
                ready_in_minutes: r.ready_in_minutes,
                servings: r.servings,
            })
            .collect();
        Ok(SearchResults {
            total_results: results.len() as u32,
            results,
        })
    }

    async fn recipe_details(&self, id: i64) -> Result<SourceRecipe, SourceError> {
        self.record(format!("details:{}", id));
        if self.broken.contains(&id) {
            return Err(SourceError::ApiError(500, "upstream exploded".to_string()));
        }
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }

    async fn analyzed_instructions(&self, id: i64) -> Result<Vec<InstructionBlock>, SourceError> {
        self.record(format!("instructions:{}", id));
        Ok(self.instructions.get(&id).cloned().unwrap_or_default())
    }

    async fn random_recipes(&self, count: u32, tags: &str) -> Result<Vec<SourceRecipe>, SourceError> {
        self.record(format!("random:{}:{}", count, tags));
        Ok(self.records.values().take(count as usize).cloned().collect())
    }

    fn source_name(&self) -> &'static str {
        "Spoonacular"
    }
}

/// Video search returning a fixed id, or failing
#[derive(Debug)]
pub struct FakeVideoSearch {
    pub video_id: Option<String>,
    pub fail: bool,
}

#[async_trait]
impl VideoSearch for FakeVideoSearch {
    async fn best_match(&self, _query: &str) -> Result<Option<String>, SourceError> {
        if self.fail {
            return Err(SourceError::RateLimitExceeded);
        }
        Ok(self.video_id.clone())
    }
}

pub fn block(steps: &[&str]) -> InstructionBlock {
    InstructionBlock {
        name: String::new(),
        steps: steps
            .iter()
            .enumerate()
            .map(|(i, step)| InstructionStep {
                number: i as u32 + 1,
                step: step.to_string(),
                image: None,
            })
            .collect(),
    }
}

/// A realistic detailed record
pub fn source_recipe(id: i64, title: &str, ready_in_minutes: u32) -> SourceRecipe {
    SourceRecipe {
        id,
        title: title.to_string(),
        image: Some(format!("https://img.example.com/{}.jpg", id)),
        summary: Some(format!("<p>A <b>{}</b> everyone loves &amp; enjoys.</p>", title)),
        ready_in_minutes: Some(ready_in_minutes),
        servings: Some(4),
        source_url: Some(format!("https://example.com/recipes/{}", id)),
        source_name: None,
        nutrition: Some(SourceNutrition {
            nutrients: vec![
                nutrient("Calories", 512.6, "kcal"),
                nutrient("Protein", 21.5, "g"),
                nutrient("Carbohydrates", 64.0, "g"),
                nutrient("Fat", 18.25, "g"),
                nutrient("Sodium", 820.4, "mg"),
            ],
        }),
        extended_ingredients: vec![
            SourceIngredient {
                id: Some(1),
                name: "black beans".to_string(),
                amount: 1.0,
                unit: "can".to_string(),
                original: "1 can black beans, drained".to_string(),
                nutrition: None,
            },
            SourceIngredient {
                id: Some(2),
                name: "tortillas".to_string(),
                amount: 8.0,
                unit: String::new(),
                original: "8 small tortillas".to_string(),
                nutrition: None,
            },
            SourceIngredient {
                id: Some(3),
                name: "lime juice".to_string(),
                amount: 1.5,
                unit: "tbsp".to_string(),
                original: "1 1/2 tbsp lime juice".to_string(),
                nutrition: None,
            },
        ],
        analyzed_instructions: Vec::new(),
    }
}

fn nutrient(name: &str, amount: f64, unit: &str) -> SourceNutrient {
    SourceNutrient {
        name: name.to_string(),
        amount,
        unit: unit.to_string(),
    }
}
