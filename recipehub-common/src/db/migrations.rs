//! Database schema migrations
//!
//! Versioned, idempotent schema changes applied after the baseline
//! `CREATE TABLE IF NOT EXISTS` pass. Each migration checks the current
//! shape before altering anything, so re-running is harmless.
//!
//! Never edit a released migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: lookup indexes for recipe children and categories
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: recipe lookup indexes");

    let statements = [
        "CREATE INDEX IF NOT EXISTS idx_recipes_category ON recipes(category_id)",
        "CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id, position)",
        "CREATE INDEX IF NOT EXISTS idx_directions_recipe ON directions(recipe_id, step_number)",
        "CREATE INDEX IF NOT EXISTS idx_conversations_user ON ai_conversations(user_id)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: add max_viewers to live_sessions
///
/// Early databases tracked only the current viewer count.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: add max_viewers to live_sessions");

    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('live_sessions') WHERE name = 'max_viewers'",
    )
    .fetch_one(pool)
    .await?;

    if has_column > 0 {
        info!("  max_viewers column already exists - skipping");
        return Ok(());
    }

    sqlx::query("ALTER TABLE live_sessions ADD COLUMN max_viewers INTEGER NOT NULL DEFAULT 0")
        .execute(pool)
        .await?;

    info!("  Added max_viewers column to live_sessions table");
    Ok(())
}
