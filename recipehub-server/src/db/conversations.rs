//! AI conversation persistence
//!
//! Messages are stored as a JSON array of `{role, content}` objects.

use recipehub_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::services::llm::ChatMessage;

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub recipe_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

fn encode(messages: &[ChatMessage]) -> Result<String> {
    serde_json::to_string(messages)
        .map_err(|e| Error::Internal(format!("Serialize conversation failed: {}", e)))
}

pub async fn load_conversation(pool: &SqlitePool, id: &str) -> Result<Option<Conversation>> {
    let row = sqlx::query("SELECT id, user_id, recipe_id, messages FROM ai_conversations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let raw: String = row.get("messages");
    let messages: Vec<ChatMessage> = serde_json::from_str(&raw)
        .map_err(|e| Error::Internal(format!("Conversation {} has invalid messages: {}", id, e)))?;

    Ok(Some(Conversation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        recipe_id: row.get("recipe_id"),
        messages,
    }))
}

/// Create a conversation and return its id
pub async fn create_conversation(
    pool: &SqlitePool,
    user_id: &str,
    recipe_id: Option<&str>,
    messages: &[ChatMessage],
) -> Result<String> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO ai_conversations (id, user_id, recipe_id, messages, created_at, updated_at)
         VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(recipe_id)
    .bind(encode(messages)?)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update_messages(pool: &SqlitePool, id: &str, messages: &[ChatMessage]) -> Result<()> {
    let result = sqlx::query(
        "UPDATE ai_conversations SET messages = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(encode(messages)?)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Conversation not found: {}", id)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipehub_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_and_append() {
        let pool = init_memory_database().await.unwrap();

        let mut messages = vec![
            ChatMessage::user("Can I use butter instead of oil?"),
            ChatMessage::assistant("Yes, melt it first."),
        ];
        let id = create_conversation(&pool, "user-1", None, &messages).await.unwrap();

        messages.push(ChatMessage::user("How much?"));
        update_messages(&pool, &id, &messages).await.unwrap();

        let loaded = load_conversation(&pool, &id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.messages, messages);
    }

    #[tokio::test]
    async fn test_update_missing_conversation() {
        let pool = init_memory_database().await.unwrap();

        let result = update_messages(&pool, "nope", &[]).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
