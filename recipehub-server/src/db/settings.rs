//! Settings database operations
//!
//! Key-value accessors for the `settings` table.

use recipehub_common::config::ApiKey;
use recipehub_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Get an API key from the database
///
/// **Returns:** Some(key) if set, None otherwise
pub async fn get_api_key(db: &Pool<Sqlite>, key: ApiKey) -> Result<Option<String>> {
    get_setting::<String>(db, key.settings_key()).await
}

/// Set an API key in the database
pub async fn set_api_key(db: &Pool<Sqlite>, key: ApiKey, value: String) -> Result<()> {
    set_setting(db, key.settings_key(), value).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((Some(value),)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
