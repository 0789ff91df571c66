//! Import operation results

use serde::Serialize;

use super::Recipe;

/// Result of importing a single external recipe
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub recipe: Recipe,
    /// The source id was already imported; nothing was written
    pub already_exists: bool,
    /// Directions were synthesized by the fallback generator
    pub directions_generated: bool,
}

/// One recipe written during a bulk import
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRecipe {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub category: String,
}

/// One recipe that failed during a bulk import; the batch carried on
#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub title: String,
    pub error: String,
}

/// Summary of a bulk import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkImportSummary {
    pub imported: Vec<ImportedRecipe>,
    /// Titles of recipes whose source id was already present
    pub skipped: Vec<String>,
    pub errors: Vec<ImportFailure>,
}

impl BulkImportSummary {
    pub fn total_seen(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.errors.len()
    }
}
