//! Recipe import orchestration
//!
//! Fetch → normalize → (fallback directions) → persist, for a single source
//! id or a batch of random recipes. Batch items run strictly one after the
//! other with a fixed pause between those that hit the source API.

use recipehub_common::config::ImportConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::direction_generator::{DirectionGenerator, DirectionRequest, IngredientLine};
use super::normalizer::{self, NormalizeOptions};
use super::recipe_persister::persist_recipe;
use super::recipe_source::{RecipeSource, SourceError, SourceRecipe};
use super::youtube_client::VideoSearch;
use crate::db::recipes;
use crate::models::{
    BulkImportSummary, CategoryRef, ImportFailure, ImportOutcome, ImportedRecipe, NewRecipe, Recipe,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("{0}")]
    InvalidInput(String),

    /// Another request persisted the same source id first
    #[error("Recipe {0} is already being imported")]
    AlreadyImporting(i64),

    #[error("Failed to persist recipe: {0}")]
    Persist(#[from] recipehub_common::Error),
}

/// Per-request import behavior
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Attach a YouTube video found by title search
    pub lookup_video: bool,
    /// Category used instead of the path default
    pub category_override: Option<CategoryRef>,
}

impl ImportOptions {
    /// Defaults for a single import: look up a video
    pub fn single() -> Self {
        Self {
            lookup_video: true,
            category_override: None,
        }
    }

    /// Defaults for a bulk import: no video lookup
    pub fn bulk() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct Importer {
    db: SqlitePool,
    source: Arc<dyn RecipeSource>,
    videos: Option<Arc<dyn VideoSearch>>,
    directions: Option<DirectionGenerator>,
    config: ImportConfig,
}

impl Importer {
    pub fn new(db: SqlitePool, source: Arc<dyn RecipeSource>, config: ImportConfig) -> Self {
        Self {
            db,
            source,
            videos: None,
            directions: None,
            config,
        }
    }

    pub fn with_video_search(mut self, videos: Arc<dyn VideoSearch>) -> Self {
        self.videos = Some(videos);
        self
    }

    pub fn with_direction_generator(mut self, generator: DirectionGenerator) -> Self {
        self.directions = Some(generator);
        self
    }

    /// Import one recipe by its source id
    ///
    /// Idempotent: an already imported id returns the stored recipe with
    /// `already_exists` set and writes nothing.
    pub async fn import_one(
        &self,
        source_id: i64,
        options: &ImportOptions,
    ) -> Result<ImportOutcome, ImportError> {
        if let Some(recipe) = self.find_existing(source_id).await? {
            tracing::info!(source_id, recipe_id = %recipe.id, "Recipe already imported");
            return Ok(ImportOutcome {
                recipe,
                already_exists: true,
                directions_generated: false,
            });
        }

        let details = self.source.recipe_details(source_id).await?;
        let category = options
            .category_override
            .clone()
            .unwrap_or_else(CategoryRef::general);

        self.import_record(&details, category, options.lookup_video).await
    }

    /// Import `count` random recipes matching `tags`
    ///
    /// Already imported ids are skipped; per-item failures are collected and
    /// the batch continues.
    pub async fn bulk_import(
        &self,
        tags: &str,
        count: u32,
        options: &ImportOptions,
    ) -> Result<BulkImportSummary, ImportError> {
        let tags = tags.trim();
        if tags.is_empty() {
            return Err(ImportError::InvalidInput("Tags parameter is required".to_string()));
        }
        let count = count.clamp(1, self.config.max_bulk_count.max(1));

        tracing::info!(tags, count, "Starting bulk import");

        let records = self.source.random_recipes(count, tags).await?;
        let category = options
            .category_override
            .clone()
            .unwrap_or_else(|| normalizer::category_from_tags(tags));
        let delay = Duration::from_millis(self.config.inter_item_delay_ms);

        let mut summary = BulkImportSummary::default();
        let mut hit_api = false;

        for record in &records {
            match self.find_existing(record.id).await {
                Ok(Some(_)) => {
                    tracing::info!(source_id = record.id, title = %record.title, "Already imported, skipping");
                    summary.skipped.push(record.title.clone());
                    continue;
                }
                Ok(None) => {}
                Err(e) => {
                    summary.errors.push(ImportFailure {
                        title: record.title.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            }

            if hit_api && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            hit_api = true;

            match self.import_record(record, category.clone(), options.lookup_video).await {
                Ok(outcome) => {
                    tracing::info!(
                        title = %outcome.recipe.title,
                        category = %outcome.recipe.category.name,
                        "Imported recipe"
                    );
                    summary.imported.push(ImportedRecipe {
                        id: outcome.recipe.id,
                        title: outcome.recipe.title,
                        slug: outcome.recipe.slug,
                        category: outcome.recipe.category.name,
                    });
                }
                Err(e) => {
                    tracing::warn!(title = %record.title, error = %e, "Failed to import recipe");
                    summary.errors.push(ImportFailure {
                        title: record.title.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            tags,
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            failed = summary.errors.len(),
            "Bulk import finished"
        );

        Ok(summary)
    }

    async fn find_existing(&self, source_id: i64) -> Result<Option<Recipe>, ImportError> {
        match recipes::find_id_by_source_id(&self.db, source_id).await? {
            Some(id) => Ok(recipes::load_recipe(&self.db, &id).await?),
            None => Ok(None),
        }
    }

    async fn import_record(
        &self,
        record: &SourceRecipe,
        category: CategoryRef,
        lookup_video: bool,
    ) -> Result<ImportOutcome, ImportError> {
        let instructions = match self.source.analyzed_instructions(record.id).await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::warn!(source_id = record.id, error = %e, "Instruction fetch failed, treating as none");
                Vec::new()
            }
        };

        let youtube_id = if lookup_video {
            self.find_video(&record.title).await
        } else {
            None
        };

        let options = NormalizeOptions {
            category,
            youtube_id,
            summary_max_chars: self.config.summary_max_chars,
            default_servings: self.config.default_servings,
            source_name: self.source.source_name().to_string(),
        };
        let mut recipe = normalizer::normalize(record, &instructions, &options);

        let directions_generated = if recipe.directions.is_empty() {
            self.fill_directions(&mut recipe).await
        } else {
            false
        };

        let persisted = match persist_recipe(&self.db, &recipe).await {
            Ok(persisted) => persisted,
            Err(e) if e.is_unique_violation() => {
                if recipes::find_id_by_source_id(&self.db, record.id).await?.is_some() {
                    return Err(ImportError::AlreadyImporting(record.id));
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let stored = recipes::load_recipe(&self.db, &persisted.id)
            .await?
            .ok_or_else(|| {
                recipehub_common::Error::Internal(format!("Recipe {} vanished after insert", persisted.id))
            })?;

        Ok(ImportOutcome {
            recipe: stored,
            already_exists: false,
            directions_generated,
        })
    }

    async fn find_video(&self, title: &str) -> Option<String> {
        let videos = self.videos.as_ref()?;
        match videos.best_match(title).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(title, error = %e, "Video lookup failed, continuing without video");
                None
            }
        }
    }

    /// Generate directions in place; failures leave the recipe without any
    async fn fill_directions(&self, recipe: &mut NewRecipe) -> bool {
        let Some(generator) = &self.directions else {
            tracing::warn!(title = %recipe.title, "No directions and no text generator configured");
            return false;
        };

        let request = DirectionRequest {
            title: recipe.title.clone(),
            servings: Some(recipe.servings),
            ingredients: recipe.ingredients.iter().map(IngredientLine::from).collect(),
        };

        match generator.generate(&request).await {
            Ok(directions) => {
                recipe.directions = directions;
                true
            }
            Err(e) => {
                tracing::warn!(
                    title = %recipe.title,
                    error = %e,
                    "Direction generation failed, saving recipe without directions"
                );
                false
            }
        }
    }
}
