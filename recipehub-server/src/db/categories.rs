//! Category database operations

use recipehub_common::Result;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use crate::models::CategoryRef;

/// Get existing category by slug or create it
///
/// Runs on the caller's connection so it can take part in the import
/// transaction. Returns (category_id, created).
pub async fn get_or_create_category(
    conn: &mut SqliteConnection,
    category: &CategoryRef,
) -> Result<(String, bool)> {
    let existing = sqlx::query("SELECT id FROM categories WHERE slug = ?")
        .bind(&category.slug)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = existing {
        return Ok((row.get("id"), false));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO categories (id, name, slug) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(&category.name)
        .bind(&category.slug)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(category_id = %id, slug = %category.slug, "Created category");

    Ok((id, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipehub_common::db::init_memory_database;

    #[tokio::test]
    async fn test_get_or_create_reuses_by_slug() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let (first, created) = get_or_create_category(&mut conn, &CategoryRef::new("Desserts"))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = get_or_create_category(&mut conn, &CategoryRef::new("Desserts"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
