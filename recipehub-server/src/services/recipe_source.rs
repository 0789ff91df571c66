//! External recipe source abstraction
//!
//! The import pipeline talks to a [`RecipeSource`] rather than a concrete
//! client so tests can run it against canned records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Recipe source client errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Recipe not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Named nutrient amount (`{"name": "Protein", "amount": 12.5, "unit": "g"}`)
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceNutrient {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceNutrition {
    #[serde(default)]
    pub nutrients: Vec<SourceNutrient>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SourceIngredient {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub nutrition: Option<SourceNutrition>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct InstructionStep {
    pub number: u32,
    pub step: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// One block of analyzed instructions (sub-recipes get their own block)
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct InstructionBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub steps: Vec<InstructionStep>,
}

/// Detailed recipe record as returned by the source
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecipe {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub nutrition: Option<SourceNutrition>,
    #[serde(default)]
    pub extended_ingredients: Vec<SourceIngredient>,
    #[serde(default)]
    pub analyzed_instructions: Vec<InstructionBlock>,
}

/// Search hit (abbreviated record)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ready_in_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub total_results: u32,
}

/// Source of external recipe records
#[async_trait]
pub trait RecipeSource: Send + Sync + fmt::Debug {
    async fn search(&self, query: &str, number: u32) -> Result<SearchResults, SourceError>;

    /// Full record including nutrition and extended ingredients
    async fn recipe_details(&self, id: i64) -> Result<SourceRecipe, SourceError>;

    async fn analyzed_instructions(&self, id: i64) -> Result<Vec<InstructionBlock>, SourceError>;

    /// Random detailed records filtered by comma-separated tags
    async fn random_recipes(&self, count: u32, tags: &str) -> Result<Vec<SourceRecipe>, SourceError>;

    fn source_name(&self) -> &'static str;
}
