//! Recipe database operations
//!
//! Insert helpers take a `SqliteConnection` so the persister can run them
//! inside one transaction. Loaders read from the pool.

use recipehub_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{
    Category, Difficulty, Direction, Ingredient, NewDirection, NewIngredient, NewRecipe,
    NutritionFacts, Recipe,
};

/// Video type recorded when a YouTube id is attached
pub const VIDEO_TYPE_YOUTUBE: &str = "youtube";

/// Find the recipe imported from an external source id
pub async fn find_id_by_source_id(pool: &SqlitePool, source_id: i64) -> Result<Option<String>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM recipes WHERE source_id = ?")
        .bind(source_id)
        .fetch_optional(pool)
        .await?;

    Ok(id)
}

/// True when a recipe already uses this slug
pub async fn slug_exists(conn: &mut SqliteConnection, slug: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE slug = ?")
        .bind(slug)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}

/// Insert the recipe row (children are written separately)
pub async fn insert_recipe(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    slug: &str,
    category_id: &str,
    recipe: &NewRecipe,
) -> Result<()> {
    let video_type = recipe.youtube_id.as_ref().map(|_| VIDEO_TYPE_YOUTUBE);

    sqlx::query(
        r#"
        INSERT INTO recipes (
            id, source_id, slug, title, description, summary,
            prep_time, cook_time, total_time, servings, difficulty,
            image_url, youtube_id, video_type, source_url, source_name,
            category_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(recipe_id)
    .bind(recipe.source_id)
    .bind(slug)
    .bind(&recipe.title)
    .bind(&recipe.description)
    .bind(&recipe.summary)
    .bind(recipe.prep_time as i64)
    .bind(recipe.cook_time as i64)
    .bind(recipe.total_time as i64)
    .bind(recipe.servings as i64)
    .bind(recipe.difficulty.as_str())
    .bind(&recipe.image_url)
    .bind(&recipe.youtube_id)
    .bind(video_type)
    .bind(&recipe.source_url)
    .bind(&recipe.source_name)
    .bind(category_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert ingredients in list order; `position` is the list index
pub async fn insert_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    ingredients: &[NewIngredient],
) -> Result<()> {
    for (position, ingredient) in ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO ingredients (
                id, recipe_id, position, amount, unit, name, original,
                calories, protein, carbs, fat
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(recipe_id)
        .bind(position as i64)
        .bind(&ingredient.amount)
        .bind(&ingredient.unit)
        .bind(&ingredient.name)
        .bind(&ingredient.original)
        .bind(ingredient.calories)
        .bind(ingredient.protein)
        .bind(ingredient.carbs)
        .bind(ingredient.fat)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn insert_directions(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    directions: &[NewDirection],
) -> Result<()> {
    for direction in directions {
        sqlx::query(
            "INSERT INTO directions (id, recipe_id, step_number, instruction, image_url)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(recipe_id)
        .bind(direction.step_number as i64)
        .bind(&direction.instruction)
        .bind(&direction.image_url)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn insert_nutrition(
    conn: &mut SqliteConnection,
    recipe_id: &str,
    nutrition: &NutritionFacts,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO nutrition (recipe_id, calories, protein, carbs, fat, fiber, sugar, sodium)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(recipe_id)
    .bind(nutrition.calories)
    .bind(nutrition.protein)
    .bind(nutrition.carbs)
    .bind(nutrition.fat)
    .bind(nutrition.fiber)
    .bind(nutrition.sugar)
    .bind(nutrition.sodium)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Replace all directions of a recipe atomically
///
/// Returns the number of directions written. Fails with `NotFound` when the
/// recipe does not exist.
pub async fn replace_directions(
    pool: &SqlitePool,
    recipe_id: &str,
    directions: &[NewDirection],
) -> Result<usize> {
    let mut tx = pool.begin().await?;

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Err(Error::NotFound(format!("Recipe not found: {}", recipe_id)));
    }

    sqlx::query("DELETE FROM directions WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    insert_directions(&mut tx, recipe_id, directions).await?;

    sqlx::query("UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(recipe_id, count = directions.len(), "Replaced recipe directions");

    Ok(directions.len())
}

const RECIPE_COLUMNS: &str = r#"
    r.id, r.source_id, r.slug, r.title, r.description, r.summary,
    r.prep_time, r.cook_time, r.total_time, r.servings, r.difficulty,
    r.image_url, r.youtube_id, r.video_type, r.source_url, r.source_name,
    r.created_at,
    c.id AS category_id, c.name AS category_name, c.slug AS category_slug
"#;

/// Load a recipe tree by id
pub async fn load_recipe(pool: &SqlitePool, recipe_id: &str) -> Result<Option<Recipe>> {
    let sql = format!(
        "SELECT {} FROM recipes r JOIN categories c ON c.id = r.category_id WHERE r.id = ?",
        RECIPE_COLUMNS
    );
    let row = sqlx::query(&sql).bind(recipe_id).fetch_optional(pool).await?;

    match row {
        Some(row) => Ok(Some(load_children(pool, row).await?)),
        None => Ok(None),
    }
}

/// Load a recipe tree by slug
pub async fn load_recipe_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Recipe>> {
    let sql = format!(
        "SELECT {} FROM recipes r JOIN categories c ON c.id = r.category_id WHERE r.slug = ?",
        RECIPE_COLUMNS
    );
    let row = sqlx::query(&sql).bind(slug).fetch_optional(pool).await?;

    match row {
        Some(row) => Ok(Some(load_children(pool, row).await?)),
        None => Ok(None),
    }
}

async fn load_children(pool: &SqlitePool, row: SqliteRow) -> Result<Recipe> {
    let id: String = row.get("id");

    let difficulty: String = row.get("difficulty");
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|e: String| Error::Internal(format!("Recipe {}: {}", id, e)))?;

    let ingredients = sqlx::query(
        "SELECT id, position, amount, unit, name, original, calories, protein, carbs, fat
         FROM ingredients WHERE recipe_id = ? ORDER BY position",
    )
    .bind(&id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| Ingredient {
        id: r.get("id"),
        position: r.get("position"),
        amount: r.get("amount"),
        unit: r.get("unit"),
        name: r.get("name"),
        original: r.get("original"),
        calories: r.get("calories"),
        protein: r.get("protein"),
        carbs: r.get("carbs"),
        fat: r.get("fat"),
    })
    .collect();

    let directions = sqlx::query(
        "SELECT id, step_number, instruction, image_url
         FROM directions WHERE recipe_id = ? ORDER BY step_number",
    )
    .bind(&id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| Direction {
        id: r.get("id"),
        step_number: r.get("step_number"),
        instruction: r.get("instruction"),
        image_url: r.get("image_url"),
    })
    .collect();

    let nutrition = sqlx::query(
        "SELECT calories, protein, carbs, fat, fiber, sugar, sodium
         FROM nutrition WHERE recipe_id = ?",
    )
    .bind(&id)
    .fetch_optional(pool)
    .await?
    .map(|r| NutritionFacts {
        calories: r.get("calories"),
        protein: r.get("protein"),
        carbs: r.get("carbs"),
        fat: r.get("fat"),
        fiber: r.get("fiber"),
        sugar: r.get("sugar"),
        sodium: r.get("sodium"),
    });

    Ok(Recipe {
        source_id: row.get("source_id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        summary: row.get("summary"),
        prep_time: row.get("prep_time"),
        cook_time: row.get("cook_time"),
        total_time: row.get("total_time"),
        servings: row.get("servings"),
        difficulty,
        image_url: row.get("image_url"),
        youtube_id: row.get("youtube_id"),
        video_type: row.get("video_type"),
        source_url: row.get("source_url"),
        source_name: row.get("source_name"),
        category: Category {
            id: row.get("category_id"),
            name: row.get("category_name"),
            slug: row.get("category_slug"),
        },
        ingredients,
        directions,
        nutrition,
        created_at: row.get("created_at"),
        id,
    })
}

/// Number of stored recipes
pub async fn count_recipes(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
