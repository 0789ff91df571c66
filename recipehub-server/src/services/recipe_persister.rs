//! Recipe persistence
//!
//! Writes a normalized recipe and all of its children in one transaction:
//! category get-or-create, recipe row with a unique slug, ingredients,
//! directions and nutrition. A failure at any step rolls the whole tree back.

use recipehub_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{categories, recipes};
use crate::models::NewRecipe;
use crate::services::slug::unique_slug;
use crate::utils::retry_on_lock;

/// How long a persist keeps retrying while another writer holds the lock
const LOCK_RETRY_MS: u64 = 5000;

/// Identity of a freshly written recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecipe {
    pub id: String,
    pub slug: String,
    pub category_created: bool,
}

/// Persist a recipe tree atomically
pub async fn persist_recipe(pool: &SqlitePool, recipe: &NewRecipe) -> Result<PersistedRecipe> {
    let persisted = retry_on_lock("persist_recipe", LOCK_RETRY_MS, || write_tree(pool, recipe)).await?;

    tracing::info!(
        recipe_id = %persisted.id,
        slug = %persisted.slug,
        source_id = ?recipe.source_id,
        ingredients = recipe.ingredients.len(),
        directions = recipe.directions.len(),
        has_nutrition = recipe.nutrition.is_some(),
        "Persisted recipe"
    );

    Ok(persisted)
}

async fn write_tree(pool: &SqlitePool, recipe: &NewRecipe) -> Result<PersistedRecipe> {
    let mut tx = pool.begin().await?;

    let (category_id, category_created) =
        categories::get_or_create_category(&mut tx, &recipe.category).await?;

    let slug = unique_slug(&recipe.title, &mut *tx).await?;
    let id = Uuid::new_v4().to_string();

    recipes::insert_recipe(&mut tx, &id, &slug, &category_id, recipe).await?;
    recipes::insert_ingredients(&mut tx, &id, &recipe.ingredients).await?;
    recipes::insert_directions(&mut tx, &id, &recipe.directions).await?;
    if let Some(nutrition) = &recipe.nutrition {
        recipes::insert_nutrition(&mut tx, &id, nutrition).await?;
    }

    tx.commit().await?;

    Ok(PersistedRecipe {
        id,
        slug,
        category_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryRef, Difficulty, NewDirection, NewIngredient, NutritionFacts};
    use recipehub_common::db::init_memory_database;

    fn sample(title: &str, source_id: Option<i64>) -> NewRecipe {
        NewRecipe {
            source_id,
            title: title.to_string(),
            description: "A weeknight favourite".to_string(),
            summary: "A weeknight favourite".to_string(),
            prep_time: 9,
            cook_time: 21,
            total_time: 30,
            servings: 4,
            difficulty: Difficulty::Easy,
            image_url: None,
            youtube_id: Some("dQw4w9WgXcQ".to_string()),
            source_url: None,
            source_name: Some("Spoonacular".to_string()),
            category: CategoryRef::new("Dinner"),
            ingredients: vec![
                NewIngredient {
                    amount: "1".into(),
                    unit: Some("can".into()),
                    name: "black beans".into(),
                    original: "1 can black beans".into(),
                    ..Default::default()
                },
                NewIngredient {
                    amount: "8".into(),
                    unit: None,
                    name: "tortillas".into(),
                    original: "8 tortillas".into(),
                    ..Default::default()
                },
            ],
            directions: vec![
                NewDirection {
                    step_number: 1,
                    instruction: "Warm the beans.".into(),
                    image_url: None,
                },
                NewDirection {
                    step_number: 2,
                    instruction: "Fill the tortillas.".into(),
                    image_url: None,
                },
            ],
            nutrition: Some(NutritionFacts {
                calories: 420,
                protein: 18.0,
                carbs: 60.5,
                fat: 9.0,
                fiber: Some(12.0),
                sugar: None,
                sodium: Some(700),
            }),
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_persist_writes_full_tree() {
        let pool = init_memory_database().await.unwrap();

        let persisted = persist_recipe(&pool, &sample("Spicy Black Bean Tacos!", Some(42)))
            .await
            .unwrap();
        assert_eq!(persisted.slug, "spicy-black-bean-tacos");
        assert!(persisted.category_created);

        let recipe = recipes::load_recipe(&pool, &persisted.id).await.unwrap().unwrap();
        assert_eq!(recipe.source_id, Some(42));
        assert_eq!(recipe.category.slug, "dinner");
        assert_eq!(recipe.video_type.as_deref(), Some("youtube"));
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[1].name, "tortillas");
        assert_eq!(recipe.directions.len(), 2);
        assert_eq!(recipe.nutrition.as_ref().map(|n| n.calories), Some(420));
    }

    #[tokio::test]
    async fn test_same_title_gets_suffixed_slug() {
        let pool = init_memory_database().await.unwrap();

        let first = persist_recipe(&pool, &sample("Spicy Black Bean Tacos!", Some(1))).await.unwrap();
        let second = persist_recipe(&pool, &sample("Spicy Black Bean Tacos!", Some(2))).await.unwrap();

        assert_eq!(first.slug, "spicy-black-bean-tacos");
        assert_eq!(second.slug, "spicy-black-bean-tacos-2");
        assert!(!second.category_created);
        assert_eq!(count(&pool, "categories").await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_source_id_is_unique_violation() {
        let pool = init_memory_database().await.unwrap();

        persist_recipe(&pool, &sample("Tacos", Some(7))).await.unwrap();
        let err = persist_recipe(&pool, &sample("Other Tacos", Some(7))).await.unwrap_err();

        assert!(err.is_unique_violation());
        assert_eq!(count(&pool, "recipes").await, 1);
    }

    #[tokio::test]
    async fn test_child_failure_rolls_back_everything() {
        let pool = init_memory_database().await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_directions BEFORE INSERT ON directions
             BEGIN SELECT RAISE(ABORT, 'directions rejected'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = persist_recipe(&pool, &sample("Doomed Stew", Some(9))).await;
        assert!(result.is_err());

        assert_eq!(count(&pool, "recipes").await, 0);
        assert_eq!(count(&pool, "ingredients").await, 0);
        assert_eq!(count(&pool, "categories").await, 0);
        assert_eq!(count(&pool, "nutrition").await, 0);
    }

    #[tokio::test]
    async fn test_recipe_without_directions_or_nutrition() {
        let pool = init_memory_database().await.unwrap();
        let mut recipe = sample("Plain Rice", None);
        recipe.directions.clear();
        recipe.nutrition = None;
        recipe.youtube_id = None;

        let persisted = persist_recipe(&pool, &recipe).await.unwrap();
        let loaded = recipes::load_recipe(&pool, &persisted.id).await.unwrap().unwrap();

        assert!(loaded.directions.is_empty());
        assert!(loaded.nutrition.is_none());
        assert!(loaded.video_type.is_none());
    }
}
