//! Data models for recipehub-server

pub mod import_result;
pub mod live_session;
pub mod recipe;

pub use import_result::{BulkImportSummary, ImportFailure, ImportOutcome, ImportedRecipe};
pub use live_session::LiveSession;
pub use recipe::{
    Category, CategoryRef, Difficulty, Direction, Ingredient, NewDirection, NewIngredient,
    NewRecipe, NutritionFacts, Recipe,
};
