//! Spoonacular API client
//!
//! API documentation: https://spoonacular.com/food-api/docs
//!
//! The API key travels as the `apiKey` query parameter. Outbound requests are
//! paced with a token bucket so bulk imports stay inside the plan's quota.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use super::recipe_source::{
    InstructionBlock, RecipeSource, SearchResults, SourceError, SourceRecipe,
};

const SPOONACULAR_BASE_URL: &str = "https://api.spoonacular.com";
const REQUESTS_PER_SECOND: u32 = 2;

#[derive(Debug, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    recipes: Vec<SourceRecipe>,
}

/// Spoonacular API client
pub struct SpoonacularClient {
    client: Client,
    base_url: String,
    api_key: String,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl fmt::Debug for SpoonacularClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoonacularClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SpoonacularClient {
    pub fn new(api_key: String) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, SPOONACULAR_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, SourceError> {
        if api_key.trim().is_empty() {
            return Err(SourceError::NotConfigured(
                "Spoonacular API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(recipehub_common::config::get_user_agent())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| SourceError::NetworkError(e.to_string()))?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// GET request for `path` with `params` plus the key parameter
    fn request(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .query(&[("apiKey", self.api_key.as_str())])
    }

    fn search_request(&self, query: &str, number: u32) -> RequestBuilder {
        self.request(
            "/recipes/complexSearch",
            &[
                ("query", query.to_string()),
                ("number", number.to_string()),
                ("addRecipeInformation", "true".to_string()),
                ("fillIngredients", "true".to_string()),
            ],
        )
    }

    fn details_request(&self, id: i64) -> RequestBuilder {
        self.request(
            &format!("/recipes/{}/information", id),
            &[("includeNutrition", "true".to_string())],
        )
    }

    fn instructions_request(&self, id: i64) -> RequestBuilder {
        self.request(&format!("/recipes/{}/analyzedInstructions", id), &[])
    }

    fn random_request(&self, count: u32, tags: &str) -> RequestBuilder {
        let mut params = vec![("number", count.to_string())];
        if !tags.trim().is_empty() {
            params.push(("tags", tags.trim().to_string()));
        }
        self.request("/recipes/random", &params)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, SourceError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(request = %what, "Querying Spoonacular API");

        // reqwest errors carry the request URL, which holds the key
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::NetworkError(format!("{}: {}", what, e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, what, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::ParseError(format!("{}: {}", what, e.without_url())))
    }
}

/// Map a non-2xx status onto a typed error
fn status_error(status: StatusCode, what: &str, body: String) -> SourceError {
    match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(what.to_string()),
        // Spoonacular answers 402 when the daily point quota is spent
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            SourceError::RateLimitExceeded
        }
        _ => SourceError::ApiError(status.as_u16(), body),
    }
}

#[async_trait]
impl RecipeSource for SpoonacularClient {
    async fn search(&self, query: &str, number: u32) -> Result<SearchResults, SourceError> {
        let results: SearchResults = self
            .get_json(self.search_request(query, number), "complexSearch")
            .await?;

        tracing::info!(
            query = %query,
            returned = results.results.len(),
            total = results.total_results,
            "Spoonacular search complete"
        );

        Ok(results)
    }

    async fn recipe_details(&self, id: i64) -> Result<SourceRecipe, SourceError> {
        let recipe: SourceRecipe = self
            .get_json(self.details_request(id), &format!("recipe {}", id))
            .await?;

        tracing::info!(
            source_id = id,
            title = %recipe.title,
            ingredients = recipe.extended_ingredients.len(),
            "Retrieved recipe from Spoonacular"
        );

        Ok(recipe)
    }

    async fn analyzed_instructions(&self, id: i64) -> Result<Vec<InstructionBlock>, SourceError> {
        self.get_json(self.instructions_request(id), &format!("instructions {}", id))
            .await
    }

    async fn random_recipes(&self, count: u32, tags: &str) -> Result<Vec<SourceRecipe>, SourceError> {
        let response: RandomResponse = self
            .get_json(self.random_request(count, tags), "random")
            .await?;

        tracing::info!(
            tags = %tags,
            requested = count,
            returned = response.recipes.len(),
            "Retrieved random recipes from Spoonacular"
        );

        Ok(response.recipes)
    }

    fn source_name(&self) -> &'static str {
        "Spoonacular"
    }
}
