//! Recipe catalog records
//!
//! `New*` types are the normalized, not-yet-persisted shape produced by the
//! normalizer. The plain types are what the database hands back, serialized
//! in camelCase for the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recipe difficulty, bucketed from total time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Bucket by total minutes: ≤30 Easy, ≤60 Medium, otherwise Hard
    pub fn from_total_minutes(total_minutes: u32) -> Self {
        match total_minutes {
            0..=30 => Difficulty::Easy,
            31..=60 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

/// Category a recipe is filed under (name + unique slug)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

impl CategoryRef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: crate::services::slug::slugify(name),
        }
    }

    pub fn general() -> Self {
        Self::new("General")
    }
}

/// Normalized recipe tree ready to be written
#[derive(Debug, Clone)]
pub struct NewRecipe {
    /// External provider id, used for idempotent re-import
    pub source_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub summary: String,
    pub prep_time: u32,
    pub cook_time: u32,
    pub total_time: u32,
    pub servings: u32,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    pub youtube_id: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub category: CategoryRef,
    pub ingredients: Vec<NewIngredient>,
    pub directions: Vec<NewDirection>,
    pub nutrition: Option<NutritionFacts>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIngredient {
    pub amount: String,
    pub unit: Option<String>,
    pub name: String,
    /// Display string as written by the source ("2 cups flour, sifted")
    pub original: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDirection {
    pub step_number: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Per-serving nutrition; macros default to zero, micros are optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub position: i64,
    pub amount: String,
    pub unit: Option<String>,
    pub name: String,
    pub original: String,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Direction {
    pub id: String,
    pub step_number: i64,
    pub instruction: String,
    pub image_url: Option<String>,
}

/// Stored recipe with its children
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub source_id: Option<i64>,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub summary: String,
    pub prep_time: i64,
    pub cook_time: i64,
    pub total_time: i64,
    pub servings: i64,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    pub youtube_id: Option<String>,
    pub video_type: Option<String>,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub category: Category,
    pub ingredients: Vec<Ingredient>,
    pub directions: Vec<Direction>,
    pub nutrition: Option<NutritionFacts>,
    pub created_at: String,
}
