//! Recipe search, import and lookup endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::{CategoryRef, Recipe};
use crate::services::recipe_source::SearchResults;
use crate::services::{ImportOptions, Importer};
use super::ApiJson;
use crate::{ApiError, ApiResult, AppState};

const DEFAULT_SEARCH_RESULTS: u32 = 10;
const MAX_SEARCH_RESULTS: u32 = 100;
const DEFAULT_BULK_COUNT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub number: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub spoonacular_id: Option<i64>,
    /// Overrides the single-import default (video lookup on)
    pub lookup_video: Option<bool>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportRequest {
    #[serde(default)]
    pub tags: String,
    pub count: Option<u32>,
    pub lookup_video: Option<bool>,
    pub category: Option<String>,
}

fn importer(state: &AppState) -> ApiResult<&Importer> {
    state
        .importer
        .as_ref()
        .ok_or_else(|| ApiError::internal("Recipe import is not configured (missing Spoonacular API key)"))
}

fn category_override(name: Option<&str>) -> Option<CategoryRef> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(CategoryRef::new)
}

/// GET /api/recipes/search?query=pasta&number=10
pub async fn search_recipes(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Json<SearchResults>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Query parameter is required".to_string()));
    }

    let source = state
        .source
        .as_ref()
        .ok_or_else(|| ApiError::internal("Recipe search is not configured (missing Spoonacular API key)"))?;

    let number = params
        .number
        .unwrap_or(DEFAULT_SEARCH_RESULTS)
        .clamp(1, MAX_SEARCH_RESULTS);

    let results = source.search(query, number).await?;
    Ok(Json(results))
}

/// POST /api/recipes/import
///
/// **Request:** `{"spoonacularId": 716429}`
/// **Response:** 201 `{success, recipe}`, or 200 `{success, recipe, alreadyExists: true}`
pub async fn import_recipe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImportRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let source_id = request
        .spoonacular_id
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("Spoonacular ID is required".to_string()))?;

    let mut options = ImportOptions::single();
    if let Some(lookup_video) = request.lookup_video {
        options.lookup_video = lookup_video;
    }
    options.category_override = category_override(request.category.as_deref());

    let outcome = importer(&state)?.import_one(source_id, &options).await?;

    if outcome.already_exists {
        return Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "recipe": outcome.recipe, "alreadyExists": true })),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "recipe": outcome.recipe,
            "directionsGenerated": outcome.directions_generated,
        })),
    ))
}

/// POST /api/recipes/bulk-import
///
/// **Request:** `{"tags": "dessert,italian", "count": 10}`
/// **Response:** 201 `{success, imported, skipped, recipes, errors?}`
pub async fn bulk_import(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkImportRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut options = ImportOptions::bulk();
    if let Some(lookup_video) = request.lookup_video {
        options.lookup_video = lookup_video;
    }
    options.category_override = category_override(request.category.as_deref());

    let count = request.count.unwrap_or(DEFAULT_BULK_COUNT);
    let summary = importer(&state)?
        .bulk_import(&request.tags, count, &options)
        .await?;

    let mut body = json!({
        "success": true,
        "imported": summary.imported.len(),
        "skipped": summary.skipped.len(),
        "recipes": summary.imported,
    });
    if !summary.errors.is_empty() {
        body["errors"] = json!(summary.errors);
    }

    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/recipes/:slug
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Recipe>> {
    crate::db::recipes::load_recipe_by_slug(&state.db, &slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))
}

/// Build recipe routes
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipes/search", get(search_recipes))
        .route("/api/recipes/import", post(import_recipe))
        .route("/api/recipes/bulk-import", post(bulk_import))
        .route("/api/recipes/:slug", get(get_recipe))
}
